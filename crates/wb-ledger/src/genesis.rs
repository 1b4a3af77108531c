use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};
use wb_types::Account;

use crate::error::{LedgerError, Result};
use crate::tx::Balances;

/// Initial ledger distribution, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Informational only. An unparseable value is dropped, not fatal.
    #[serde(
        default,
        deserialize_with = "lenient_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub genesis_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    pub balances: Balances,
}

impl Genesis {
    /// Read and parse the genesis document at `path`.
    ///
    /// A missing or unreadable file is [`LedgerError::Io`]; anything that does
    /// not parse is [`LedgerError::GenesisParse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)?;
        let genesis = Self::from_slice(&raw).map_err(|e| LedgerError::GenesisParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(
            path = %path.display(),
            accounts = genesis.balances.len(),
            chain_id = genesis.chain_id.as_deref().unwrap_or("-"),
            total_supply = ?genesis.total_supply(),
            "genesis loaded"
        );
        Ok(genesis)
    }

    pub fn from_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn into_balances(self) -> Balances {
        self.balances
    }

    pub fn balance_of(&self, account: &Account) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Sum of all genesis balances, `None` if it does not fit in a `u64`.
    pub fn total_supply(&self) -> Option<u64> {
        self.balances
            .values()
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
    }
}

fn lenient_time<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let parsed = raw
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));
    if parsed.is_none() {
        warn!(genesis_time = %raw, "ignoring unparseable genesis_time");
    }
    Ok(parsed)
}
