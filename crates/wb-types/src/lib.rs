//! Foundation types for the Warchief Ledger.
//!
//! Every other `wb-*` crate depends on `wb-types`.
//!
//! # Key Types
//!
//! - [`Account`]: Opaque balance-holding address
//! - [`Snapshot`]: 256-bit digest of the committed transaction log

pub mod account;
pub mod error;
pub mod snapshot;

pub use account::Account;
pub use error::TypeError;
pub use snapshot::Snapshot;
