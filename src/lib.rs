//! # Event Log DIDs
//!
//! Registration and resolution for DID methods whose state is an append-only
//! log of signed key events (a key event log, KEL) rather than a single
//! mutable record.
//!
//! The crate persists event logs, merges newly seen events with those already
//! stored, and resolves an identifier by folding its log into a document. It
//! does not interpret events: signature verification, key derivation and the
//! folding itself are supplied by the implementer through the traits in
//! [`provider`]. Storage is abstracted behind [`EventStore`].
//!
//! ```rust,ignore
//! let method = LocalMethod::new("kel", MemoryStore::new(), provider)?;
//! let created = method.create(config).await?;
//!
//! let registry = Registry::new().with(method);
//! let resolved = registry.resolve(&created.did).await?;
//! ```

pub mod config;
mod error;
mod event;
mod method;
pub mod provider;
mod registrar;
mod registry;
mod resolver;
pub mod store;
mod url;

pub use self::config::{Config, StoreConfig};
pub use self::error::{Error, Result};
pub use self::event::{Event, EventLog, new_events};
pub use self::method::{Created, DidMethod, LocalMethod};
pub use self::provider::{Creator, IdExtractor, Inception, Provider, Validator};
pub use self::registrar::Registrar;
pub use self::registry::{ContentType, Metadata, Registry, Resolved};
pub use self::resolver::Resolver;
pub use self::store::{EventStore, FileStore, LockTable, LogLock, MemoryStore, Store};
pub use self::url::DidUrl;
