//! # Resolver
//!
//! The read path for event-log DIDs: read the identifier's full log and fold
//! it into a document with the method's [`Validator`]. Documents are never
//! cached, every call re-derives the document from the stored log.

use tracing::instrument;

use crate::error::{Error, Result};
use crate::event::EventLog;
use crate::provider::Validator;
use crate::store::EventStore;

/// Resolves identifiers of a single event-log DID method. Never writes to
/// the store.
#[derive(Clone, Debug)]
pub struct Resolver<S, V> {
    store: S,
    validator: V,
}

impl<S, V> Resolver<S, V>
where
    S: EventStore,
    V: Validator,
{
    /// Create a resolver reading from `store`.
    pub const fn new(store: S, validator: V) -> Self {
        Self { store, validator }
    }

    /// Resolve `id` (the method-specific identifier) to its current document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no events are stored for `id`,
    /// [`Error::Validation`] if the stored log is rejected by the validator,
    /// and [`Error::Store`] if the store fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, id: &str) -> Result<V::Document> {
        let events = self.events(id).await?;
        if events.is_empty() {
            return Err(Error::NotFound(format!("no event log found for {id}")));
        }
        tracing::debug!("{id}: folding {} events", events.len());

        // only validated logs are persisted, so a rejection here means the
        // store was modified out of band or the validator changed
        self.validator.validate(&events).await.map_err(|e| {
            tracing::warn!("{id}: stored event log failed validation: {e:#}");
            Error::Validation(format!("stored event log for {id} failed validation: {e:#}"))
        })
    }

    /// The raw event log stored for `id`, empty if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the store fails.
    pub async fn events(&self, id: &str) -> Result<EventLog> {
        self.store.read(id).await.map_err(Error::Store)
    }
}
