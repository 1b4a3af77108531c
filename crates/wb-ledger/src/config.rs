use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// File name of the genesis document inside a data directory.
pub const GENESIS_FILE: &str = "genesis.json";
/// File name of the transaction log inside a data directory.
pub const LOG_FILE: &str = "tx.db";

/// Flush/sync strategy for log appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every appended record.
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

/// Where the ledger lives on disk.
///
/// Both paths are explicit; nothing is resolved against the process working
/// directory behind the caller's back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub genesis_path: PathBuf,
    pub log_path: PathBuf,
    #[serde(default)]
    pub sync_mode: SyncMode,
}

impl LedgerConfig {
    pub fn new(genesis_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            genesis_path: genesis_path.into(),
            log_path: log_path.into(),
            sync_mode: SyncMode::default(),
        }
    }

    /// Conventional layout: `<dir>/genesis.json` and `<dir>/tx.db`.
    pub fn from_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(GENESIS_FILE), dir.join(LOG_FILE))
    }

    /// Load from a TOML file. Relative paths inside the file are resolved
    /// against the file's own directory.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&raw).map_err(|e| LedgerError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(base) = path.parent() {
            config.genesis_path = resolve(base, &config.genesis_path);
            config.log_path = resolve(base, &config.log_path);
        }
        Ok(config)
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
