use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    persist::{DEFAULT_BULK_THRESHOLD, DEFAULT_CHUNK_SIZE, StrategyChoice},
    store::{DEFAULT_BUSY_TIMEOUT_MS, StoreConfig},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// SQLite database file; in-memory when absent.
    pub database: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub bulk_threshold: usize,
    pub chunk_size: usize,
    pub strategy: StrategyChoice,
    pub input_encoding: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            bulk_threshold: DEFAULT_BULK_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            strategy: StrategyChoice::Auto,
            input_encoding: None,
        }
    }
}

impl LoaderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: LoaderConfig = serde_yaml::from_str(raw)?;
        anyhow::ensure!(config.chunk_size > 0, "chunk_size must be greater than zero");
        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.database.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}
