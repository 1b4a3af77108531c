//! Cryptographic primitives for the Warchief Ledger.
//!
//! The ledger needs exactly one: a SHA-256 digest over the full byte
//! content of the transaction log. It wraps the `sha2` crate and performs
//! no custom cryptography.

pub mod hasher;

pub use hasher::SnapshotHasher;
