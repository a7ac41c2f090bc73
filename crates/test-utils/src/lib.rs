//! Test helpers for event-log DIDs.
//!
//! [`KelProvider`] is a small, deterministic key event log method: enough
//! structure (sequence numbers, identifiers, a digest chain) for validation to
//! be order sensitive, with none of the cryptography of a real method.
//! [`FaultyStore`] wraps a [`MemoryStore`](credibil_kel::MemoryStore) and fails on
//! demand.

mod provider;
mod store;

pub use crate::provider::{Document, KelEvent, KelProvider, Keys, Seed, VerificationMethod};
pub use crate::store::FaultyStore;
