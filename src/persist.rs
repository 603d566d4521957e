//! Batch persistence engine.
//!
//! Two strategies with deliberately different failure models:
//!
//! - [`insert_transactional()`]: one transaction, one savepoint per row. A
//!   rejected row is rolled back on its own, counted and reported; the rest
//!   of the batch still commits. If SQLite aborts the whole transaction the
//!   call fails and nothing is kept.
//! - [`insert_bulk()`]: one transaction, one set-based `INSERT ... SELECT`
//!   per chunk that expands parallel JSON arrays into rows. Any chunk error
//!   rolls back the whole call and no per-row errors are reported.

use std::fmt;

use clap::ValueEnum;
use log::{debug, info, warn};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::{
    error::{LoaderError, LoaderResult},
    record::PersistableUser,
    store::UserStore,
};

pub const DEFAULT_BULK_THRESHOLD: usize = 5_000;
pub const DEFAULT_CHUNK_SIZE: usize = 1_000;

const INSERT_ROW_SQL: &str =
    "INSERT INTO users (name, age, address, additional_info) VALUES (?1, ?2, ?3, ?4)";

const INSERT_CHUNK_SQL: &str = "
INSERT INTO users (name, age, address, additional_info)
SELECT n.value, a.value, ad.value, ai.value
FROM json_each(?1) AS n
JOIN json_each(?2) AS a ON a.key = n.key
JOIN json_each(?3) AS ad ON ad.key = n.key
JOIN json_each(?4) AS ai ON ai.key = n.key
ORDER BY n.key";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertError {
    pub identifier: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInsertResult {
    pub inserted_count: usize,
    pub failed_count: usize,
    pub errors: Vec<InsertError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StrategyChoice {
    /// Pick by volume using the bulk threshold
    #[default]
    Auto,
    /// Always insert row by row, reporting per-row failures
    Transactional,
    /// Always insert in columnar chunks, all-or-nothing
    Bulk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistStrategy {
    Transactional,
    Bulk,
}

impl PersistStrategy {
    /// More than `threshold` records go through the bulk path.
    pub fn for_volume(count: usize, threshold: usize) -> Self {
        if count > threshold {
            PersistStrategy::Bulk
        } else {
            PersistStrategy::Transactional
        }
    }

    pub fn resolve(choice: StrategyChoice, count: usize, threshold: usize) -> Self {
        match choice {
            StrategyChoice::Auto => Self::for_volume(count, threshold),
            StrategyChoice::Transactional => PersistStrategy::Transactional,
            StrategyChoice::Bulk => PersistStrategy::Bulk,
        }
    }
}

impl fmt::Display for PersistStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistStrategy::Transactional => write!(f, "transactional"),
            PersistStrategy::Bulk => write!(f, "bulk"),
        }
    }
}

pub fn persist(
    store: &mut UserStore,
    users: &[PersistableUser],
    strategy: PersistStrategy,
    chunk_size: usize,
) -> LoaderResult<BatchInsertResult> {
    info!("Persisting {} user(s) using the {strategy} path", users.len());
    match strategy {
        PersistStrategy::Transactional => insert_transactional(store, users),
        PersistStrategy::Bulk => insert_bulk(store, users, chunk_size),
    }
}

/// Serialized column values for one user.
struct EncodedUser<'a> {
    name: &'a str,
    age: i64,
    address: Option<String>,
    additional_info: Option<String>,
}

impl<'a> EncodedUser<'a> {
    fn encode(user: &'a PersistableUser) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: &user.name,
            age: user.age,
            address: user.address.as_ref().map(serde_json::to_string).transpose()?,
            additional_info: user
                .additional_info
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        })
    }
}

pub fn insert_transactional(
    store: &mut UserStore,
    users: &[PersistableUser],
) -> LoaderResult<BatchInsertResult> {
    let mut result = BatchInsertResult::default();
    let mut tx = store.connection_mut().transaction()?;

    for user in users {
        let encoded = match EncodedUser::encode(user) {
            Ok(encoded) => encoded,
            Err(err) => {
                record_failure(&mut result, user, err.to_string());
                continue;
            }
        };
        let mut savepoint = tx.savepoint()?;
        let outcome = savepoint.prepare_cached(INSERT_ROW_SQL).and_then(|mut stmt| {
            stmt.execute(params![
                encoded.name,
                encoded.age,
                encoded.address,
                encoded.additional_info
            ])
        });
        match outcome {
            Ok(_) => {
                savepoint.commit()?;
                result.inserted_count += 1;
            }
            Err(source) => {
                // SQLite already rolled back the enclosing transaction.
                if savepoint.is_autocommit() {
                    return Err(LoaderError::TransactionAborted {
                        identifier: user.name.clone(),
                        source,
                    });
                }
                savepoint.rollback()?;
                savepoint.commit()?;
                record_failure(&mut result, user, source.to_string());
            }
        }
    }

    tx.commit()?;
    info!(
        "Transactional insert committed: {} inserted, {} failed",
        result.inserted_count, result.failed_count
    );
    Ok(result)
}

fn record_failure(result: &mut BatchInsertResult, user: &PersistableUser, message: String) {
    warn!("Insert failed for '{}': {message}", user.name);
    result.failed_count += 1;
    result.errors.push(InsertError {
        identifier: user.name.clone(),
        message,
    });
}

/// Four parallel JSON arrays, one per column, for a single chunk.
#[derive(Debug, Default)]
struct ColumnarChunk {
    names: Vec<String>,
    ages: Vec<i64>,
    addresses: Vec<Option<String>>,
    additional_infos: Vec<Option<String>>,
}

impl ColumnarChunk {
    fn transpose(users: &[PersistableUser]) -> LoaderResult<Self> {
        let mut chunk = ColumnarChunk::default();
        for user in users {
            let encoded = EncodedUser::encode(user)?;
            chunk.names.push(encoded.name.to_string());
            chunk.ages.push(encoded.age);
            chunk.addresses.push(encoded.address);
            chunk.additional_infos.push(encoded.additional_info);
        }
        Ok(chunk)
    }

    fn to_params(&self) -> LoaderResult<[String; 4]> {
        Ok([
            serde_json::to_string(&self.names)?,
            serde_json::to_string(&self.ages)?,
            serde_json::to_string(&self.addresses)?,
            serde_json::to_string(&self.additional_infos)?,
        ])
    }
}

pub fn insert_bulk(
    store: &mut UserStore,
    users: &[PersistableUser],
    chunk_size: usize,
) -> LoaderResult<BatchInsertResult> {
    let chunk_size = chunk_size.max(1);
    let tx = store.connection_mut().transaction()?;
    let mut inserted = 0usize;

    for (chunk_idx, chunk) in users.chunks(chunk_size).enumerate() {
        let [names, ages, addresses, additional_infos] =
            ColumnarChunk::transpose(chunk)?.to_params()?;
        let rows = tx
            .prepare_cached(INSERT_CHUNK_SQL)
            .and_then(|mut stmt| stmt.execute(params![names, ages, addresses, additional_infos]))
            .map_err(|source| LoaderError::BulkChunk {
                chunk: chunk_idx,
                source,
            })?;
        debug!("Chunk {chunk_idx}: inserted {rows} row(s)");
        inserted += rows;
    }

    tx.commit()?;
    info!("Bulk insert committed {inserted} row(s)");
    Ok(BatchInsertResult {
        inserted_count: inserted,
        failed_count: 0,
        errors: Vec::new(),
    })
}
