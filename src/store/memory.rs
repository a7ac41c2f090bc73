//! In-memory event log store.

use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;

use super::{EventStore, LockTable, LogLock};
use crate::event::{Event, EventLog};

/// Event logs held in process memory. Clones share the same logs.
///
/// Mostly useful for tests and short-lived agents: nothing survives the
/// process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    logs: Arc<DashMap<String, EventLog>>,
    locks: LockTable,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identifiers with a non-empty log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.iter().filter(|entry| !entry.value().is_empty()).count()
    }

    /// Returns `true` when no identifier has any events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventStore for MemoryStore {
    async fn read(&self, id: &str) -> Result<EventLog> {
        Ok(self.logs.get(id).map(|log| log.value().clone()).unwrap_or_default())
    }

    async fn append(&self, id: &str, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        // the entry holds the shard's write lock for the whole extend
        self.logs.entry(id.to_string()).or_default().extend_from_slice(events);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.logs.remove(id).is_some_and(|(_, log)| !log.is_empty()))
    }

    async fn lock(&self, id: &str) -> LogLock {
        self.locks.lock(id).await
    }
}
