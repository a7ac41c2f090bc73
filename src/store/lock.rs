//! Per-identifier write locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Locks = DashMap<String, Arc<Mutex<()>>>;

/// A table of per-identifier mutexes. Clones share the same table.
///
/// Stores hand out locks from a table shared by every handle onto the same
/// logs, so writers going through different handles still exclude each
/// other.
#[derive(Clone, Debug, Default)]
pub struct LockTable {
    locks: Arc<Locks>,
}

impl LockTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn lock(&self, id: &str) -> LogLock {
        // the map entry must not be held across the await
        let mutex = self.locks.entry(id.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        LogLock {
            id: id.to_string(),
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of identifiers currently locked or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns `true` when no identifier is locked or waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive write access to one identifier's log, released on drop.
#[derive(Debug)]
pub struct LogLock {
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<Locks>,
}

impl Drop for LogLock {
    fn drop(&mut self) {
        drop(self.guard.take());
        // drop the entry once no other task holds or waits on it
        self.locks.remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
