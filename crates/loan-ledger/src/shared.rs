use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use crate::clock::SystemClock;
use crate::ledger::LoanLedger;

/// Cloneable handle that gives multi-threaded hosts one critical section
/// around the ledger. Each call holds the lock for its whole duration.
pub struct SharedLedger<C, T, K = SystemClock> {
    inner: Arc<Mutex<LoanLedger<C, T, K>>>,
}

impl<C, T, K> Clone for SharedLedger<C, T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, T, K> SharedLedger<C, T, K> {
    pub fn new(ledger: LoanLedger<C, T, K>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run `f` with exclusive access to the ledger
    pub fn with<R>(&self, f: impl FnOnce(&mut LoanLedger<C, T, K>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Hold the lock across several calls that must not interleave with others
    pub fn lock(&self) -> MutexGuard<'_, LoanLedger<C, T, K>> {
        self.inner.lock()
    }
}
