//! Ledger state engine for the Warchief Ledger.
//!
//! This crate is the heart of the system. It provides:
//! - Genesis loading (initial balances)
//! - The transaction model and all-or-nothing application rules
//! - `TxLog`, the append-only newline-delimited transaction log
//! - `State`, which replays the log, stages new transactions in a mempool,
//!   and persists them while keeping the log snapshot digest current
//! - `SharedState`, a lock-guarded handle for multi-threaded hosts

pub mod config;
pub mod error;
pub mod genesis;
pub mod log;
pub mod shared;
pub mod state;
pub mod tx;

pub use config::{LedgerConfig, SyncMode};
pub use error::{LedgerError, Result};
pub use genesis::Genesis;
pub use log::{LogRecord, LogRecords, TxLog};
pub use shared::{SharedState, StateView};
pub use state::State;
pub use tx::{apply, Balances, Tx, REWARD_MARKER};

pub use wb_types::{Account, Snapshot};
