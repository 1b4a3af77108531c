use std::fmt;

use serde::{Deserialize, Serialize};

/// Integrity fingerprint of the committed transaction log.
///
/// A `Snapshot` is the 256-bit hash of the log's complete byte content at the
/// moment it was computed. It says nothing about individual records; two logs
/// share a snapshot iff their bytes are identical.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot([u8; 32]);

impl Snapshot {
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines and messages.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({})", self.short_hex())
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_full_hex() {
        let snapshot = Snapshot::from_hash([7; 32]);
        let display = format!("{snapshot}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, snapshot.to_hex());
        assert_eq!(snapshot.short_hex(), "07070707");
        assert_eq!(format!("{snapshot:?}"), "Snapshot(07070707)");
    }

    #[test]
    fn equality_follows_bytes() {
        assert_eq!(Snapshot::from_hash([1; 32]), Snapshot::from_hash([1; 32]));
        assert_ne!(Snapshot::from_hash([1; 32]), Snapshot::from_hash([2; 32]));
    }
}
