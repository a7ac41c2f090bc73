//! # Registrar
//!
//! The write path for event-log DIDs. The registrar is the only component
//! that appends to or clears a log.
//!
//! An update locates the log for the identifier its first event belongs to,
//! drops any events already stored, validates the merged sequence and only
//! then appends the net-new events. A rejected update leaves the store
//! untouched.

use tracing::instrument;

use crate::error::{Error, Result};
use crate::event::{Event, new_events};
use crate::provider::{Inception, Provider};
use crate::store::EventStore;

/// Registers events for identifiers of a single event-log DID method.
///
/// Updates for the same identifier are serialized: the read, dedup, validate
/// and append steps run under the store's lock for the identifier, so
/// registrars sharing a store exclude each other. Updates for different
/// identifiers proceed concurrently.
#[derive(Clone, Debug)]
pub struct Registrar<S, P> {
    store: S,
    provider: P,
}

impl<S, P> Registrar<S, P>
where
    S: EventStore,
    P: Provider,
{
    /// Create a registrar writing to `store` using the event semantics of
    /// `provider`.
    pub const fn new(store: S, provider: P) -> Self {
        Self { store, provider }
    }

    /// Register `events`, returning the document resolved from the
    /// identifier's full, updated log.
    ///
    /// The identifier is derived from the first event. Events already in the
    /// stored log are skipped, so re-registering the same events is a no-op
    /// that returns the same document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] if `events` is empty or no identifier
    /// can be derived from its first event, [`Error::Validation`] if the
    /// merged sequence is rejected, and [`Error::Store`] if the store fails.
    /// The log is not modified in any of these cases.
    #[instrument(level = "debug", skip(self, events), fields(events = events.len()))]
    pub async fn update(&self, events: &[Event]) -> Result<P::Document> {
        let Some(first) = events.first() else {
            return Err(Error::Extraction("no events to register".into()));
        };
        let id = self.provider.extract_id(first).await.map_err(|e| {
            Error::Extraction(format!("cannot derive identifier from event: {e:#}"))
        })?;

        let _lock = self.store.lock(&id).await;

        let previous = self.store.read(&id).await.map_err(Error::Store)?;
        let added = new_events(&previous, events);
        tracing::debug!("{id}: {} stored events, {} new", previous.len(), added.len());

        let mut candidate = previous;
        candidate.extend_from_slice(&added);
        let document = self.provider.validate(&candidate).await.map_err(|e| {
            tracing::warn!("{id}: rejected update: {e:#}");
            Error::Validation(format!("events for {id} failed validation: {e:#}"))
        })?;

        if !added.is_empty() {
            self.store.append(&id, &added).await.map_err(Error::Store)?;
        }

        Ok(document)
    }

    /// Clear every event stored for `id`.
    ///
    /// Returns the store's acknowledgement: `true` when a non-empty log was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the store fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _lock = self.store.lock(id).await;
        self.store.delete(id).await.map_err(Error::Store)
    }

    /// Create a new inception event.
    ///
    /// The event is not registered: pass it to [`Registrar::update`] to
    /// persist it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Creation`] if the provider fails to create the event.
    #[instrument(level = "debug", skip_all)]
    pub async fn create(&self, config: P::Config) -> Result<Inception<P::KeyMaterial>> {
        self.provider
            .create(config)
            .await
            .map_err(|e| Error::Creation(format!("failed to create inception event: {e:#}")))
    }
}

#[cfg(test)]
mod test {
    use anyhow::{anyhow, bail};

    use super::*;
    use crate::provider::{Creator, IdExtractor, Validator};
    use crate::store::MemoryStore;

    // Events are "<id>:<n>"; a log is valid when its numbers run 0, 1, 2...
    #[derive(Clone)]
    struct Counter;

    impl Validator for Counter {
        type Document = (String, usize);

        async fn validate(&self, events: &[Event]) -> anyhow::Result<Self::Document> {
            let mut id = String::new();
            for (n, event) in events.iter().enumerate() {
                let (event_id, sn) =
                    event.as_str().split_once(':').ok_or_else(|| anyhow!("malformed"))?;
                if sn.parse::<usize>()? != n {
                    bail!("out of order");
                }
                id = event_id.to_string();
            }
            Ok((id, events.len()))
        }
    }

    impl IdExtractor for Counter {
        async fn extract_id(&self, event: &Event) -> anyhow::Result<String> {
            let (id, _) = event.as_str().split_once(':').ok_or_else(|| anyhow!("malformed"))?;
            Ok(id.to_string())
        }
    }

    impl Creator for Counter {
        type Config = String;
        type KeyMaterial = ();

        async fn create(&self, id: String) -> anyhow::Result<Inception<()>> {
            if id.is_empty() {
                bail!("no id");
            }
            Ok(Inception {
                event: Event::new(format!("{id}:0")),
                id,
                key_material: (),
            })
        }
    }

    fn events(payloads: &[&str]) -> Vec<Event> {
        payloads.iter().map(|p| Event::from(*p)).collect()
    }

    #[tokio::test]
    async fn update_persists() {
        let store = MemoryStore::new();
        let registrar = Registrar::new(store.clone(), Counter);

        let doc = registrar.update(&events(&["a:0", "a:1"])).await.expect("should update");
        assert_eq!(doc, ("a".to_string(), 2));
        assert_eq!(store.read("a").await.expect("should read").len(), 2);
    }

    #[tokio::test]
    async fn update_rejected() {
        let store = MemoryStore::new();
        let registrar = Registrar::new(store.clone(), Counter);
        registrar.update(&events(&["a:0"])).await.expect("should update");

        let err = registrar.update(&events(&["a:0", "a:2"])).await.expect_err("should reject");
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.read("a").await.expect("should read"), events(&["a:0"]));
    }

    #[tokio::test]
    async fn empty_update() {
        let registrar = Registrar::new(MemoryStore::new(), Counter);
        let err = registrar.update(&[]).await.expect_err("should reject");
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn malformed_first_event() {
        let store = MemoryStore::new();
        let registrar = Registrar::new(store.clone(), Counter);

        let err = registrar.update(&events(&["garbage"])).await.expect_err("should reject");
        assert!(matches!(err, Error::Extraction(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn create_forwards() {
        let registrar = Registrar::new(MemoryStore::new(), Counter);

        let inception = registrar.create("a".into()).await.expect("should create");
        assert_eq!(inception.id, "a");
        assert_eq!(inception.event, Event::from("a:0"));

        let err = registrar.create(String::new()).await.expect_err("should fail");
        assert!(matches!(err, Error::Creation(_)));
    }

    #[tokio::test]
    async fn delete_clears() {
        let store = MemoryStore::new();
        let registrar = Registrar::new(store.clone(), Counter);
        registrar.update(&events(&["a:0"])).await.expect("should update");

        assert!(registrar.delete("a").await.expect("should delete"));
        assert!(!registrar.delete("a").await.expect("should delete"));
        assert!(store.read("a").await.expect("should read").is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates() {
        let store = MemoryStore::new();
        let registrar = Registrar::new(store.clone(), Counter);
        registrar.update(&events(&["a:0"])).await.expect("should update");

        // unserialized, several tasks could read the same log and all append
        // "a:1"
        let mut tasks = Vec::new();
        for n in 0..8 {
            // half clone the registrar, half build their own over the store
            let registrar =
                if n % 2 == 0 { registrar.clone() } else { Registrar::new(store.clone(), Counter) };
            tasks.push(tokio::spawn(async move {
                registrar.update(&events(&["a:0", "a:1"])).await.expect("should update")
            }));
        }
        for task in tasks {
            let doc = task.await.expect("task should complete");
            assert_eq!(doc, ("a".to_string(), 2));
        }

        assert_eq!(store.read("a").await.expect("should read"), events(&["a:0", "a:1"]));
    }
}
