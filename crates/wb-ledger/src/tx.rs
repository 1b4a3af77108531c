use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use wb_types::Account;

use crate::error::{LedgerError, Result};

/// Account → balance. Ordered so that reporting and encoding are stable.
pub type Balances = BTreeMap<Account, u64>;

/// Marker in [`Tx::data`] that turns a transaction into a reward.
pub const REWARD_MARKER: &str = "reward";

/// A single ledger instruction.
///
/// Field order is the canonical log encoding:
/// `{"from":..,"to":..,"value":..,"data":..}`. `data` is always written and
/// reads as the empty string when absent or `null`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub from: Account,
    pub to: Account,
    pub value: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Tx {
    /// A plain transfer from one account to another.
    pub fn new(from: impl Into<Account>, to: impl Into<Account>, value: u64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            value,
            data: String::new(),
        }
    }

    /// Newly minted value credited to `to`.
    pub fn reward(to: impl Into<Account>, value: u64) -> Self {
        let to = to.into();
        Self {
            from: to.clone(),
            to,
            value,
            data: REWARD_MARKER.to_string(),
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    pub fn is_reward(&self) -> bool {
        self.data == REWARD_MARKER
    }

    /// Canonical encoding: compact JSON, no trailing separator.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

/// Apply `tx` to `balances`, all or nothing.
///
/// Rewards credit `to` without touching `from`. Transfers require
/// `balances[from] >= value`. Every resulting balance is computed before any
/// entry is written, so a failed call leaves `balances` exactly as it was.
pub fn apply(balances: &mut Balances, tx: &Tx) -> Result<()> {
    if tx.is_reward() {
        let credited = credit(balances, &tx.to, tx.value)?;
        balances.insert(tx.to.clone(), credited);
        return Ok(());
    }

    let balance = balances.get(&tx.from).copied().unwrap_or(0);
    if tx.value > balance {
        return Err(LedgerError::InsufficientBalance {
            account: tx.from.clone(),
            balance,
            value: tx.value,
        });
    }

    // Self-transfer passes the balance check and changes nothing.
    if tx.from == tx.to {
        balances.entry(tx.from.clone()).or_insert(balance);
        return Ok(());
    }

    let credited = credit(balances, &tx.to, tx.value)?;
    balances.insert(tx.from.clone(), balance - tx.value);
    balances.insert(tx.to.clone(), credited);
    Ok(())
}

fn credit(balances: &Balances, account: &Account, value: u64) -> Result<u64> {
    balances
        .get(account)
        .copied()
        .unwrap_or(0)
        .checked_add(value)
        .ok_or_else(|| LedgerError::BalanceOverflow {
            account: account.clone(),
        })
}
