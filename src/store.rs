//! # Event Log Store
//!
//! A keyed, append-only log of events. Implementations own the persisted
//! event bytes; this crate only ever reads, appends to, or clears a log.
//!
//! Guarantees are per identifier: an append must be atomic with respect to
//! readers of the same identifier, and every handle onto the same logs hands
//! out the same write lock for an identifier. Nothing is implied across
//! identifiers.

mod file;
mod lock;
mod memory;

use std::future::Future;

use anyhow::Result;

pub use self::file::FileStore;
pub use self::lock::{LockTable, LogLock};
pub use self::memory::MemoryStore;
use crate::config::StoreConfig;
use crate::event::{Event, EventLog};

/// `EventStore` is implemented by providers of event log storage.
pub trait EventStore: Send + Sync + Clone {
    /// Fetch the event log for `id`, returning an empty log if none exists.
    ///
    /// Missing identifiers are not an error.
    fn read(&self, id: &str) -> impl Future<Output = Result<EventLog>> + Send;

    /// Append `events` to the end of the log for `id`, creating the log if
    /// absent.
    ///
    /// No partial append may be visible to a concurrent reader of `id`.
    fn append(&self, id: &str, events: &[Event]) -> impl Future<Output = Result<()>> + Send;

    /// Clear the log for `id`. Idempotent.
    ///
    /// Returns `true` when a non-empty log was cleared.
    fn delete(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Wait for exclusive write access to the log for `id`.
    ///
    /// The registrar holds the lock across reading, validating and appending
    /// to a log. Clones, and any other handle onto the same logs, must share
    /// the lock or concurrent writers can append the same events twice.
    fn lock(&self, id: &str) -> impl Future<Output = LogLock> + Send;
}

/// A store selected at runtime from [`StoreConfig`].
#[derive(Clone, Debug)]
pub enum Store {
    /// In-process store.
    Memory(MemoryStore),

    /// JSON-lines files on the local filesystem.
    File(FileStore),
}

impl Store {
    /// Build the store described by `config`.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        match config {
            StoreConfig::Memory => Self::Memory(MemoryStore::new()),
            StoreConfig::File { dir } => Self::File(FileStore::new(dir)),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::Memory(MemoryStore::new())
    }
}

impl EventStore for Store {
    async fn read(&self, id: &str) -> Result<EventLog> {
        match self {
            Self::Memory(store) => store.read(id).await,
            Self::File(store) => store.read(id).await,
        }
    }

    async fn append(&self, id: &str, events: &[Event]) -> Result<()> {
        match self {
            Self::Memory(store) => store.append(id, events).await,
            Self::File(store) => store.append(id, events).await,
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        match self {
            Self::Memory(store) => store.delete(id).await,
            Self::File(store) => store.delete(id).await,
        }
    }

    async fn lock(&self, id: &str) -> LogLock {
        match self {
            Self::Memory(store) => store.lock(id).await,
            Self::File(store) => store.lock(id).await,
        }
    }
}
