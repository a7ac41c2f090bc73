//! A store that fails on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, bail};
use credibil_kel::{Event, EventLog, EventStore, LogLock, MemoryStore};

/// [`MemoryStore`] with switchable read and append failures.
#[derive(Clone, Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_reads: Arc<AtomicBool>,
    fail_appends: Arc<AtomicBool>,
}

impl FaultyStore {
    /// Create a store that does not fail until told to.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads fail (`true`) or succeed (`false`).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent appends fail (`true`) or succeed (`false`).
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store, bypassing failures.
    #[must_use]
    pub const fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl EventStore for FaultyStore {
    async fn read(&self, id: &str) -> Result<EventLog> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        self.inner.read(id).await
    }

    async fn append(&self, id: &str, events: &[Event]) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.inner.append(id, events).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.inner.delete(id).await
    }

    async fn lock(&self, id: &str) -> LogLock {
        self.inner.lock(id).await
    }
}
