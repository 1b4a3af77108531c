use std::io::{self, Read};

use sha2::{Digest, Sha256};
use wb_types::Snapshot;

/// Whole-content SHA-256 hasher for the transaction log.
///
/// There is no domain prefix and no framing: the digest of a log is exactly
/// `sha256(log_bytes)`, so anyone holding the file can reproduce it with a
/// stock `sha256sum`. The hash is recomputed from scratch every time.
pub struct SnapshotHasher;

impl SnapshotHasher {
    /// Hash an in-memory copy of the log.
    pub fn digest(data: &[u8]) -> Snapshot {
        Snapshot::from_hash(Sha256::digest(data).into())
    }

    /// Hash everything `reader` yields until EOF.
    pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<Snapshot> {
        let mut hasher = Sha256::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Snapshot::from_hash(hasher.finalize().into()))
    }
}
