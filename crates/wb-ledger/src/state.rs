use std::collections::VecDeque;

use tracing::{debug, info, warn};
use wb_types::{Account, Snapshot};

use crate::config::LedgerConfig;
use crate::error::Result;
use crate::genesis::Genesis;
use crate::log::TxLog;
use crate::tx::{apply, Balances, Tx};

/// The ledger state engine.
///
/// Owns the current balances, the mempool of applied-but-unpersisted
/// transactions, the transaction log handle, and the snapshot digest of that
/// log. All mutation goes through `&mut self`, so a single caller drives the
/// engine at a time; see [`crate::SharedState`] for use behind a lock.
///
/// Transactions are applied to the balances when added, before they are
/// durable. Anything still in the mempool when the process dies is lost, and
/// the next [`State::load`] rebuilds balances from the log alone.
pub struct State {
    config: LedgerConfig,
    balances: Balances,
    mempool: VecDeque<Tx>,
    log: TxLog,
    snapshot: Snapshot,
    /// Set when a record reached the log but re-hashing it failed.
    snapshot_stale: bool,
}

impl State {
    /// Build the state from genesis plus a full replay of the log.
    ///
    /// The log must already exist. Any record that fails to decode or to
    /// apply aborts the whole load; no partially replayed state is returned.
    pub fn load(config: &LedgerConfig) -> Result<Self> {
        let genesis = Genesis::load(&config.genesis_path)?;
        let mut balances = genesis.into_balances();
        let mut log = TxLog::open(&config.log_path, config.sync_mode)?;

        let replayed = replay(&mut log, &mut balances)?;
        let snapshot = log.digest()?;

        info!(
            log = %config.log_path.display(),
            replayed,
            accounts = balances.len(),
            snapshot = %snapshot,
            "ledger state loaded"
        );

        Ok(Self {
            config: config.clone(),
            balances,
            mempool: VecDeque::new(),
            log,
            snapshot,
            snapshot_stale: false,
        })
    }

    /// Validate and apply `tx`, then stage it in the mempool.
    ///
    /// A rejected transaction leaves balances and mempool untouched.
    pub fn add(&mut self, tx: Tx) -> Result<()> {
        apply(&mut self.balances, &tx)?;
        debug!(
            from = %tx.from,
            to = %tx.to,
            value = tx.value,
            reward = tx.is_reward(),
            "transaction staged"
        );
        self.mempool.push_back(tx);
        Ok(())
    }

    /// Digest of the log as of the last load or persisted record.
    pub fn latest_snapshot(&self) -> Snapshot {
        self.snapshot
    }

    /// Flush the mempool to the log in FIFO order.
    ///
    /// Each record is appended, the whole log is re-hashed, and only then is
    /// the next record written, so the snapshot never lags the file by more
    /// than the record in flight. On error, records already written stay
    /// removed from the mempool and the rest remain queued for a retry.
    pub fn persist(&mut self) -> Result<Snapshot> {
        if self.snapshot_stale {
            self.refresh_snapshot()?;
        }

        while let Some(tx) = self.mempool.front() {
            let offset = self.log.append(tx)?;
            info!(
                offset,
                from = %tx.from,
                to = %tx.to,
                value = tx.value,
                "transaction persisted"
            );
            self.mempool.pop_front();

            self.refresh_snapshot()?;
            info!(snapshot = %self.snapshot, "new log snapshot");
        }

        Ok(self.snapshot)
    }

    /// Re-hash the log on disk and compare it with the held snapshot.
    pub fn verify_snapshot(&mut self) -> Result<bool> {
        let on_disk = self.log.digest()?;
        if on_disk != self.snapshot {
            warn!(held = %self.snapshot, on_disk = %on_disk, "snapshot does not match log");
        }
        Ok(on_disk == self.snapshot)
    }

    /// Release the log handle. Pending transactions were never durable and
    /// are discarded.
    pub fn close(self) -> Result<()> {
        if !self.mempool.is_empty() {
            warn!(
                pending = self.mempool.len(),
                "closing with unpersisted transactions"
            );
        }
        self.log.sync()?;
        debug!(log = %self.log.path().display(), "ledger state closed");
        Ok(())
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn balance_of(&self, account: &Account) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Pending transactions, oldest first.
    pub fn mempool(&self) -> impl Iterator<Item = &Tx> {
        self.mempool.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.mempool.len()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn refresh_snapshot(&mut self) -> Result<()> {
        self.snapshot_stale = true;
        self.snapshot = self.log.digest()?;
        self.snapshot_stale = false;
        Ok(())
    }
}

/// Apply every logged record on top of `balances`, in file order.
fn replay(log: &mut TxLog, balances: &mut Balances) -> Result<u64> {
    let mut replayed = 0u64;
    for record in log.records()? {
        let record = record.inspect_err(|e| warn!(error = %e, "log replay aborted"))?;
        apply(balances, &record.tx).map_err(|e| {
            warn!(line = record.line, error = %e, "logged transaction rejected on replay");
            e
        })?;
        replayed += 1;
    }
    Ok(replayed)
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("log", &self.log.path())
            .field("accounts", &self.balances.len())
            .field("pending", &self.mempool.len())
            .field("snapshot", &self.snapshot)
            .finish()
    }
}
