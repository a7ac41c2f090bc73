//! Destructure DID URLs into strongly typed components.
//!
//! A DID URL is of the form
//!
//! `did:<method>:<method-specific-id>[/<path>][?<query>][#<fragment>]`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

static DID_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        "^did:(?<method>[a-z0-9]+)",
        ":(?<id>(?:[a-zA-Z0-9._-]|%[0-9a-fA-F]{2})*(?::(?:[a-zA-Z0-9._-]|%[0-9a-fA-F]{2})+)*)",
        "(?<path>/[^?#]*)?",
        "(?:\\?(?<query>[^#]*))?",
        "(?:#(?<fragment>.*))?$"
    ))
    .expect("should compile")
});

/// Structure of a DID URL.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidUrl {
    /// The string the URL was parsed from.
    pub did_url: String,

    /// DID method, e.g. `kel` in `did:kel:...`.
    pub method: String,

    /// Method-specific ID. For event-log methods this is the identifier the
    /// event log is stored under.
    pub id: String,

    /// Path, including the leading `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Query, without the leading `?`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Fragment, without the leading `#`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl DidUrl {
    /// The DID part of the URL, `did:<method>:<method-specific-id>`.
    #[must_use]
    pub fn did(&self) -> String {
        format!("did:{}:{}", self.method, self.id)
    }
}

impl FromStr for DidUrl {
    type Err = Error;

    /// Parse a string into a strongly typed DID URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDid`] if the string is not a DID URL or has an
    /// empty method-specific ID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(caps) = DID_URL_REGEX.captures(s) else {
            return Err(Error::InvalidDid(format!("{s} is not a valid DID")));
        };
        let id = &caps["id"];
        if id.is_empty() {
            return Err(Error::InvalidDid(format!("missing method-specific id: {s}")));
        }

        Ok(Self {
            did_url: s.to_string(),
            method: caps["method"].to_string(),
            id: id.to_string(),
            path: caps.name("path").map(|m| m.as_str().to_string()),
            query: caps.name("query").map(|m| m.as_str().to_string()),
            fragment: caps.name("fragment").map(|m| m.as_str().to_string()),
        })
    }
}

impl Display for DidUrl {
    /// Format the URL as `did:<method>:<id>` with any path, query and fragment.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.id)?;
        if let Some(path) = &self.path {
            write!(f, "{path}")?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}
