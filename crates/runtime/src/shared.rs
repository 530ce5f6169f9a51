//! Mutex-guarded runtime handle for concurrent callers

use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::transaction::{Receipt, Transaction};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle; every transaction runs under one lock, so no caller
/// ever observes a half-applied transaction
#[derive(Debug, Clone, Default)]
pub struct SharedRuntime {
    inner: Arc<Mutex<Runtime>>,
}

impl SharedRuntime {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(runtime)),
        }
    }

    pub fn execute(&self, tx: &Transaction) -> Result<Receipt, RuntimeError> {
        self.lock().execute(tx)
    }

    /// Run a read-only closure against a consistent snapshot
    pub fn read<R>(&self, f: impl FnOnce(&Runtime) -> R) -> R {
        f(&self.lock())
    }

    // Runtime operations never panic mid-write, so a poisoned lock still
    // guards consistent state
    fn lock(&self) -> MutexGuard<'_, Runtime> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
