//! # Local DID Method
//!
//! Exposes a [`Resolver`] and [`Registrar`] pair as a DID method registered
//! under a method prefix, so several local methods can share one
//! [`Registry`].
//!
//! The method-specific ID of a `did:<prefix>:<id>` DID is the identifier its
//! event log is stored under.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::provider::Provider;
use crate::registrar::Registrar;
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::store::{EventStore, Store};
use crate::url::DidUrl;

/// A DID method that can be registered with a [`Registry`].
#[async_trait]
pub trait DidMethod: Send + Sync {
    /// The method name this method resolves, e.g. `kel` for `did:kel:...`.
    fn prefix(&self) -> &str;

    /// Resolve a parsed DID to its JSON document.
    ///
    /// `registry` is the registry dispatching the call, available to methods
    /// that need to resolve other DIDs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], with a message containing the DID as
    /// requested, if the DID does not exist. Other errors are
    /// method-specific.
    async fn resolve(&self, did: &DidUrl, registry: &Registry) -> Result<Value>;
}

/// A DID returned from [`LocalMethod::create`], already registered.
#[derive(Clone, Debug)]
pub struct Created<D, K> {
    /// The DID, `did:<prefix>:<id>`.
    pub did: String,

    /// The method-specific identifier.
    pub id: String,

    /// The document resolved from the inception event.
    pub document: D,

    /// Key material returned by the provider.
    pub key_material: K,
}

/// An event-log DID method backed by a local store.
#[derive(Clone, Debug)]
pub struct LocalMethod<S, P> {
    prefix: String,
    resolver: Resolver<S, P>,
    registrar: Registrar<S, P>,
}

impl<P: Provider> LocalMethod<Store, P> {
    /// Build a method from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn from_config(config: &Config, provider: P) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config.prefix.clone(), Store::from_config(&config.store), provider))
    }
}

impl<S, P> LocalMethod<S, P>
where
    S: EventStore,
    P: Provider,
{
    /// Create a method resolving `did:<prefix>:...` DIDs from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `prefix` is not a valid DID method
    /// name.
    pub fn new(prefix: impl Into<String>, store: S, provider: P) -> Result<Self> {
        let prefix = prefix.into();
        Config::new(prefix.clone()).validate()?;
        Ok(Self::build(prefix, store, provider))
    }

    fn build(prefix: String, store: S, provider: P) -> Self {
        Self {
            prefix,
            resolver: Resolver::new(store.clone(), provider.clone()),
            registrar: Registrar::new(store, provider),
        }
    }

    /// The method name.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The DID for a method-specific identifier.
    #[must_use]
    pub fn did(&self, id: &str) -> String {
        format!("did:{}:{id}", self.prefix)
    }

    /// The method's resolver.
    #[must_use]
    pub const fn resolver(&self) -> &Resolver<S, P> {
        &self.resolver
    }

    /// The method's registrar.
    #[must_use]
    pub const fn registrar(&self) -> &Registrar<S, P> {
        &self.registrar
    }

    /// Create and register a new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Creation`] if the provider cannot create an inception
    /// event, or any error [`Registrar::update`] returns when registering it.
    #[instrument(level = "debug", skip_all, fields(prefix = %self.prefix))]
    pub async fn create(&self, config: P::Config) -> Result<Created<P::Document, P::KeyMaterial>> {
        let inception = self.registrar.create(config).await?;
        let document = self.registrar.update(&[inception.event]).await?;
        tracing::debug!("created {}", self.did(&inception.id));

        Ok(Created {
            did: self.did(&inception.id),
            id: inception.id,
            document,
            key_material: inception.key_material,
        })
    }

    /// Register events received from another party, returning the updated
    /// document.
    ///
    /// # Errors
    ///
    /// See [`Registrar::update`].
    pub async fn encounter(&self, events: &[Event]) -> Result<P::Document> {
        self.registrar.update(events).await
    }

    /// Resolve a `did:<prefix>:<id>` DID or DID URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDid`] if `did` is not a DID of this method and
    /// [`Error::NotFound`] if it has no event log. See [`Resolver::resolve`]
    /// for other errors.
    pub async fn resolve(&self, did: &str) -> Result<P::Document> {
        let url = DidUrl::from_str(did)?;
        if url.method != self.prefix {
            return Err(Error::InvalidDid(format!("{did} is not a did:{} DID", self.prefix)));
        }
        self.resolve_url(&url).await
    }

    async fn resolve_url(&self, url: &DidUrl) -> Result<P::Document> {
        self.resolver.resolve(&url.id).await.map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound(format!("no event log found for {}", url.did_url)),
            e => e,
        })
    }
}

#[async_trait]
impl<S, P> DidMethod for LocalMethod<S, P>
where
    S: EventStore + 'static,
    P: Provider + 'static,
{
    fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn resolve(&self, did: &DidUrl, _: &Registry) -> Result<Value> {
        let document = self.resolve_url(did).await?;
        Ok(serde_json::to_value(document)?)
    }
}
