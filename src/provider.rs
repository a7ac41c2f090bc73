//! # Provider Traits
//!
//! Capabilities supplied by the implementer of a concrete event-log DID
//! method. This crate never signs, verifies, or interprets events itself:
//! folding a log into a document, working out which identifier an event
//! belongs to, and constructing inception events are all delegated through
//! these traits.

use std::future::Future;

use anyhow::Result;
use serde::Serialize;

use crate::event::Event;

/// Issuers of event-log based DIDs implement `Provider` to supply the
/// method's event semantics.
pub trait Provider: Validator + IdExtractor + Creator + Clone {}

/// A blanket implementation for `Provider` trait so that any type
/// implementing the required super traits is considered a `Provider`.
impl<T> Provider for T where T: Validator + IdExtractor + Creator + Clone {}

/// [`Validator`] folds an ordered event sequence into a resolved document.
///
/// Implementations must be deterministic and side-effect free: the same
/// sequence always yields the same document. Resolution relies on this since
/// documents are never stored, only re-derived from the log.
pub trait Validator: Send + Sync {
    /// The resolved document produced by a valid sequence.
    type Document: Serialize + Send;

    /// Validate `events`, in order, and return the resulting document.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence is invalid or cannot be parsed.
    fn validate(&self, events: &[Event]) -> impl Future<Output = Result<Self::Document>> + Send;
}

/// [`IdExtractor`] derives the canonical identifier an event belongs to.
///
/// Works from event content alone so the identifier of a brand-new log can be
/// found from its inception event.
pub trait IdExtractor: Send + Sync {
    /// Return the method-specific identifier for `event`.
    ///
    /// # Errors
    ///
    /// Returns an error if `event` is not a valid inception or keyed event.
    fn extract_id(&self, event: &Event) -> impl Future<Output = Result<String>> + Send;
}

/// [`Creator`] constructs an inception event for a new identifier.
pub trait Creator: Send + Sync {
    /// Method-specific creation parameters (key material source, passwords,
    /// etc.).
    type Config: Send;

    /// Key material returned to the caller alongside the inception event.
    /// Opaque to this crate.
    type KeyMaterial: Send;

    /// Create a new inception event.
    ///
    /// # Errors
    ///
    /// Returns an error if key material cannot be derived or the event cannot
    /// be constructed.
    fn create(
        &self, config: Self::Config,
    ) -> impl Future<Output = Result<Inception<Self::KeyMaterial>>> + Send;
}

/// Output of a [`Creator`].
#[derive(Clone, Debug)]
pub struct Inception<K> {
    /// The inception event establishing the identifier.
    pub event: Event,

    /// The identifier established by `event`.
    pub id: String,

    /// Key material controlling the identifier.
    pub key_material: K,
}
