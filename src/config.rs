//! # Configuration
//!
//! Settings for a local event-log DID method: the method prefix it is
//! registered under and where its event logs are kept.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the DID method prefix.
pub const PREFIX_ENV: &str = "KEL_DID_PREFIX";

/// Environment variable holding the event log directory. When unset, logs
/// are kept in memory.
pub const STORE_DIR_ENV: &str = "KEL_DID_STORE_DIR";

static METHOD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9]+$").expect("should compile"));

/// Method configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// DID method name, e.g. `kel` for `did:kel:...`.
    pub prefix: String,

    /// Event log storage.
    #[serde(default)]
    pub store: StoreConfig,
}

/// Where event logs are kept.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum StoreConfig {
    /// In process memory.
    #[default]
    Memory,

    /// One JSON-lines file per identifier under `dir`.
    File {
        /// Directory holding the log files.
        dir: PathBuf,
    },
}

impl Config {
    /// Configuration for `prefix` with in-memory storage.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            store: StoreConfig::Memory,
        }
    }

    /// Read configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `KEL_DID_PREFIX` is not set or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        let Ok(prefix) = std::env::var(PREFIX_ENV) else {
            return Err(Error::InvalidConfig(format!("{PREFIX_ENV} is not set")));
        };
        let store = match std::env::var_os(STORE_DIR_ENV) {
            Some(dir) if !dir.is_empty() => StoreConfig::File { dir: dir.into() },
            _ => StoreConfig::Memory,
        };

        let config = Self { prefix, store };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration can be used to build a method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the prefix is not a valid DID
    /// method name (lowercase letters and digits only).
    pub fn validate(&self) -> Result<()> {
        if !METHOD_REGEX.is_match(&self.prefix) {
            return Err(Error::InvalidConfig(format!(
                "invalid method prefix '{}': must match [a-z0-9]+",
                self.prefix
            )));
        }
        Ok(())
    }
}
