//! Lock-guarded handle for embedding the engine in multi-threaded hosts.
//!
//! [`State`] updates balances and mempool in two steps and drains the
//! mempool while writing, so every entry point here takes the same mutex.
//! Readers get a [`StateView`] copied out under that lock.

use std::sync::{Arc, Mutex, MutexGuard};

use wb_types::Snapshot;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::state::State;
use crate::tx::{Balances, Tx};

/// Point-in-time copy of the reportable parts of a [`State`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateView {
    pub balances: Balances,
    pub snapshot: Snapshot,
    pub pending: usize,
}

/// Cloneable, thread-safe handle to a single [`State`].
#[derive(Clone, Debug)]
pub struct SharedState {
    inner: Arc<Mutex<State>>,
}

impl SharedState {
    pub fn new(state: State) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn load(config: &LedgerConfig) -> Result<Self> {
        State::load(config).map(Self::new)
    }

    pub fn add(&self, tx: Tx) -> Result<()> {
        self.lock()?.add(tx)
    }

    pub fn persist(&self) -> Result<Snapshot> {
        self.lock()?.persist()
    }

    pub fn latest_snapshot(&self) -> Result<Snapshot> {
        Ok(self.lock()?.latest_snapshot())
    }

    pub fn view(&self) -> Result<StateView> {
        let state = self.lock()?;
        Ok(StateView {
            balances: state.balances().clone(),
            snapshot: state.latest_snapshot(),
            pending: state.pending_len(),
        })
    }

    /// Close the underlying state. Fails with [`LedgerError::StillShared`]
    /// while other clones of this handle are alive.
    pub fn close(self) -> Result<()> {
        let mutex = Arc::try_unwrap(self.inner).map_err(|_| LedgerError::StillShared)?;
        let state = mutex.into_inner().map_err(|_| LedgerError::LockPoisoned)?;
        state.close()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }
}
