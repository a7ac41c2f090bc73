//! # Errors
//!
//! Errors raised while registering or resolving identifiers backed by a key
//! event log. Delegates and stores report failures as [`anyhow::Error`]; the
//! registrar and resolver map those into the typed variants below so callers
//! can tell a missing identifier apart from a rejected event or a failing
//! store.

use thiserror::Error;

/// Result type for event log operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Typed errors for event log registration and resolution.
#[derive(Error, Debug)]
pub enum Error {
    /// No events are stored for the requested identifier.
    #[error("{0}")]
    NotFound(String),

    /// The identifier could not be derived from a supplied event.
    #[error("{0}")]
    Extraction(String),

    /// The validation delegate rejected an event sequence.
    #[error("{0}")]
    Validation(String),

    /// The underlying event store failed. The store's error is passed through
    /// unmodified.
    #[error("event store failure: {0}")]
    Store(#[source] anyhow::Error),

    /// The inception-creation delegate failed.
    #[error("{0}")]
    Creation(String),

    /// The DID could not be parsed or does not belong to the method.
    #[error("{0}")]
    InvalidDid(String),

    /// No method is registered for the DID's method prefix.
    #[error("{0}")]
    MethodNotSupported(String),

    /// Configuration is missing or invalid.
    #[error("{0}")]
    InvalidConfig(String),

    /// A resolved document could not be serialized.
    #[error("{0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Error code as registered in the W3C DID registries, where
    /// one applies.
    ///
    /// See <https://www.w3.org/TR/did-spec-registries/#error>.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "notFound",
            Self::InvalidDid(_) => "invalidDid",
            Self::MethodNotSupported(_) => "methodNotSupported",
            Self::Extraction(_) | Self::Validation(_) => "invalidEvent",
            Self::Store(_)
            | Self::Creation(_)
            | Self::InvalidConfig(_)
            | Self::Serialization(_) => "internalError",
        }
    }

    /// Human-readable description of the error.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Store(e) => format!("{e:#}"),
            Self::NotFound(msg)
            | Self::Extraction(msg)
            | Self::Validation(msg)
            | Self::Creation(msg)
            | Self::InvalidDid(msg)
            | Self::MethodNotSupported(msg)
            | Self::InvalidConfig(msg)
            | Self::Serialization(msg) => msg.clone(),
        }
    }

    /// Returns `true` when the error means the identifier has no event log,
    /// as opposed to an infrastructure or input failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Transfer the error to a JSON object suitable for a resolution
    /// response.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.code(),
            "errorMessage": self.message(),
        })
    }
}
