use std::io;
use std::path::PathBuf;

use wb_types::Account;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Genesis or log file missing, unreadable, or unwritable.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed genesis file {path}: {reason}")]
    GenesisParse { path: PathBuf, reason: String },

    /// A log record could not be decoded. `line` is 1-based.
    #[error("malformed transaction at line {line}: {reason}")]
    TxParse { line: u64, reason: String },

    #[error("insufficient balance: {account} holds {balance}, transfer needs {value}")]
    InsufficientBalance {
        account: Account,
        balance: u64,
        value: u64,
    },

    #[error("crediting {account} would overflow its balance")]
    BalanceOverflow { account: Account },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("ledger state lock poisoned")]
    LockPoisoned,

    #[error("ledger state is still shared by other handles")]
    StillShared,
}

impl LedgerError {
    /// Business-rule rejections: the transaction was refused and nothing changed.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. } | Self::BalanceOverflow { .. }
        )
    }
}

/// Convenience alias used throughout the ledger crate.
pub type Result<T> = std::result::Result<T, LedgerError>;
