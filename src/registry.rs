//! # DID Resolution Registry
//!
//! A dispatch table of [`DidMethod`]s keyed by method prefix. Resolution
//! parses the requested DID, hands it to the method registered for its
//! prefix and wraps the document in a DID resolution result.
//!
//! See [DID resolution](https://w3c.github.io/did-resolution/) for more.

use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::method::DidMethod;
use crate::url::DidUrl;

const RESOLUTION_CONTEXT: &str = "https://w3id.org/did-resolution/v1";

/// Resolves DIDs by dispatching to the method registered for their prefix.
#[derive(Clone, Default)]
pub struct Registry {
    methods: HashMap<String, Arc<dyn DidMethod>>,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("methods", &self.methods.keys()).finish()
    }
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `method` under its prefix, replacing any method already
    /// registered for that prefix.
    pub fn register(&mut self, method: impl DidMethod + 'static) -> &mut Self {
        let prefix = method.prefix().to_string();
        if self.methods.insert(prefix.clone(), Arc::new(method)).is_some() {
            tracing::debug!("replaced method registered for did:{prefix}");
        }
        self
    }

    /// Builder-style [`Registry::register`].
    #[must_use]
    pub fn with(mut self, method: impl DidMethod + 'static) -> Self {
        self.register(method);
        self
    }

    /// Returns `true` if a method is registered for `prefix`.
    #[must_use]
    pub fn supports(&self, prefix: &str) -> bool {
        self.methods.contains_key(prefix)
    }

    /// Resolve `did` to its document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDid`] if `did` cannot be parsed,
    /// [`Error::MethodNotSupported`] if no method is registered for its
    /// prefix and [`Error::NotFound`] if the DID does not exist. The
    /// `NotFound` message contains `did` exactly as requested.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self, did: &str) -> Result<Resolved> {
        let url = DidUrl::from_str(did)?;
        let Some(method) = self.methods.get(&url.method) else {
            return Err(Error::MethodNotSupported(format!("method not supported: {}", url.method)));
        };

        let document = method.resolve(&url, self).await?;
        let content_type = ContentType::of(&document);

        Ok(Resolved {
            context: RESOLUTION_CONTEXT.into(),
            metadata: Metadata {
                content_type: Some(content_type),
                did: Some(url),
                ..Metadata::default()
            },
            document: Some(document),
        })
    }

    /// Resolve `did`, reporting failure in the result's metadata rather than
    /// as an error.
    pub async fn resolution(&self, did: &str) -> Resolved {
        match self.resolve(did).await {
            Ok(resolved) => resolved,
            Err(e) => Resolved {
                context: RESOLUTION_CONTEXT.into(),
                metadata: Metadata {
                    error: Some(e.code().into()),
                    error_message: Some(e.message()),
                    ..Metadata::default()
                },
                document: None,
            },
        }
    }
}

/// Returned by [`Registry::resolve`].
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resolved {
    /// The DID resolution context.
    #[serde(rename = "@context")]
    pub context: String,

    /// Resolution metadata.
    pub metadata: Metadata,

    /// The DID document. Empty if resolution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
}

/// DID resolution metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// The Media Type of the returned document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,

    /// The resolved DID, destructured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<DidUrl>,

    /// The error code from the resolution process, if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// A human-readable explanation of the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The Media Type of the returned document.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ContentType {
    /// JSON-LD representation of a DID document.
    #[default]
    #[serde(rename = "application/did+ld+json")]
    DidLdJson,

    /// Plain JSON representation of a DID document.
    #[serde(rename = "application/did+json")]
    DidJson,
}

impl ContentType {
    // documents carrying an `@context` are JSON-LD
    fn of(document: &Value) -> Self {
        if document.get("@context").is_some() { Self::DidLdJson } else { Self::DidJson }
    }
}
