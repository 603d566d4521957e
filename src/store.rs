use std::{path::PathBuf, time::Duration};

use log::{debug, info};
use rusqlite::{Connection, types::Value as SqlValue};
use serde::{Deserialize, Serialize};

use crate::error::LoaderResult;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Upper bound enforced on `users.name` by the table definition.
pub const MAX_NAME_LENGTH: usize = 255;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(name) <= 255),
    age INTEGER NOT NULL,
    address TEXT CHECK (address IS NULL OR json_valid(address)),
    additional_info TEXT CHECK (additional_info IS NULL OR json_valid(additional_info))
);";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file; `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// A persisted row, with documents decoded back into JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub address: Option<serde_json::Value>,
    pub additional_info: Option<serde_json::Value>,
}

/// Handle over one SQLite connection, owned by the caller. Write paths in
/// [`crate::persist`] scope exactly one transaction on it.
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    pub fn open(config: &StoreConfig) -> LoaderResult<Self> {
        let conn = match &config.path {
            Some(path) => {
                debug!("Opening SQLite database {:?}", path);
                let conn = Connection::open(path)?;
                conn.execute_batch("PRAGMA journal_mode = wal;")?;
                conn
            }
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> LoaderResult<Self> {
        Self::open(&StoreConfig::default())
    }

    /// Wraps an existing connection, creating the `users` table if needed.
    pub fn from_connection(conn: Connection) -> LoaderResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn count(&self) -> LoaderResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Raw ages for reporting; `None` where the stored value is not an integer.
    pub fn ages(&self) -> LoaderResult<Vec<Option<i64>>> {
        let mut stmt = self.conn.prepare("SELECT age FROM users ORDER BY id")?;
        let ages = stmt
            .query_map([], |row| row.get::<_, SqlValue>(0))?
            .map(|value| value.map(integer_age))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ages)
    }

    pub fn all_records(&self) -> LoaderResult<Vec<StoredUser>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, age, address, additional_info FROM users ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, SqlValue>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, age, address, additional_info)| {
                Ok(StoredUser {
                    id,
                    name,
                    age: integer_age(age).unwrap_or_default(),
                    address: decode_document(address)?,
                    additional_info: decode_document(additional_info)?,
                })
            })
            .collect()
    }

    pub fn clear_all(&mut self) -> LoaderResult<u64> {
        let deleted = self.conn.execute("DELETE FROM users", [])?;
        info!("Deleted {deleted} user row(s)");
        Ok(deleted as u64)
    }
}

fn integer_age(value: SqlValue) -> Option<i64> {
    match value {
        SqlValue::Integer(age) => Some(age),
        SqlValue::Text(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn decode_document(raw: Option<String>) -> LoaderResult<Option<serde_json::Value>> {
    Ok(raw.map(|text| serde_json::from_str(&text)).transpose()?)
}
