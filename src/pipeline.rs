use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::info;
use serde::Serialize;

use crate::{
    assembler::{self, SkippedRow},
    distribution::{self, AgeDistribution},
    error::LoaderResult,
    io_utils,
    persist::{
        self, DEFAULT_BULK_THRESHOLD, DEFAULT_CHUNK_SIZE, InsertError, PersistStrategy,
        StrategyChoice,
    },
    record::{self, PersistableUser},
    store::{StoredUser, UserStore},
};

#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    pub encoding: &'static Encoding,
    pub strategy: StrategyChoice,
    pub bulk_threshold: usize,
    pub chunk_size: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            strategy: StrategyChoice::Auto,
            bulk_threshold: DEFAULT_BULK_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    pub total_records: usize,
    pub inserted: usize,
    pub failed: usize,
    pub errors: Vec<InsertError>,
    pub skipped_rows: Vec<SkippedRow>,
    pub strategy: PersistStrategy,
}

/// Parses and transforms `content` without touching storage.
pub fn prepare_users(content: &str) -> LoaderResult<(Vec<PersistableUser>, Vec<SkippedRow>)> {
    let assembly = assembler::assemble_content(content)?;
    let users = assembly
        .records
        .iter()
        .map(|flat| record::separate(&record::build_nested(flat)))
        .collect();
    Ok((users, assembly.skipped))
}

pub fn process(
    store: &mut UserStore,
    path: &Path,
    options: &ProcessOptions,
) -> LoaderResult<ProcessSummary> {
    let content = io_utils::read_input(path, options.encoding)?;
    let (users, skipped_rows) = prepare_users(&content)?;
    info!(
        "Prepared {} record(s) from {:?} ({} line(s) skipped)",
        users.len(),
        path,
        skipped_rows.len()
    );
    let strategy = PersistStrategy::resolve(options.strategy, users.len(), options.bulk_threshold);
    let result = persist::persist(store, &users, strategy, options.chunk_size)?;
    Ok(ProcessSummary {
        total_records: users.len(),
        inserted: result.inserted_count,
        failed: result.failed_count,
        errors: result.errors,
        skipped_rows,
        strategy,
    })
}

pub fn distribution(store: &UserStore) -> LoaderResult<AgeDistribution> {
    Ok(distribution::bucket_ages(&store.ages()?))
}

pub fn all_records(store: &UserStore) -> LoaderResult<Vec<StoredUser>> {
    store.all_records()
}

pub fn clear_all(store: &mut UserStore) -> LoaderResult<u64> {
    store.clear_all()
}

pub fn count(store: &UserStore) -> LoaderResult<u64> {
    store.count()
}
