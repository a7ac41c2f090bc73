//! A deterministic key event log method.
//!
//! Events are JSON objects. An inception event (`icp`) establishes an
//! identifier derived from its key; each rotation (`rot`) replaces the key,
//! increments the sequence number and commits to the digest of the event
//! before it.

use anyhow::{Context, Result, bail, ensure};
use base64ct::{Base64UrlUnpadded, Encoding};
use credibil_kel::{Creator, Event, IdExtractor, Inception, Validator};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// A single key event.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct KelEvent {
    /// `icp` or `rot`.
    #[serde(rename = "t")]
    pub kind: String,

    /// Identifier the event belongs to.
    #[serde(rename = "i")]
    pub id: String,

    /// Sequence number, starting at 0 for inception.
    #[serde(rename = "s")]
    pub sn: u64,

    /// Current public key.
    #[serde(rename = "k")]
    pub key: String,

    /// Digest of the previous event. Absent for inception.
    #[serde(rename = "p", skip_serializing_if = "Option::is_none")]
    pub prior: Option<String>,
}

impl KelEvent {
    /// Parse an event payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a key event.
    pub fn parse(event: &Event) -> Result<Self> {
        serde_json::from_str(event.as_str()).context("malformed key event")
    }

    /// Serialize into an opaque event.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_event(&self) -> Result<Event> {
        Ok(Event::new(serde_json::to_string(self)?))
    }
}

/// Creation parameters: a secret seed keys are derived from.
#[derive(Clone, Debug)]
pub struct Seed(pub String);

/// Key material for a created identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keys {
    /// Seed the keys derive from.
    pub seed: String,

    /// Current public key.
    pub public: String,
}

/// Resolved document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// JSON-LD context.
    #[serde(rename = "@context")]
    pub context: String,

    /// The DID.
    pub id: String,

    /// The current key.
    pub verification_method: Vec<VerificationMethod>,

    /// References to keys usable for authentication.
    pub authentication: Vec<String>,

    /// Sequence number of the last applied event.
    pub version_id: u64,
}

/// A public key in a [`Document`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Key ID, a DID URL.
    pub id: String,

    /// Key type.
    #[serde(rename = "type")]
    pub type_: String,

    /// The DID controlling the key.
    pub controller: String,

    /// The key.
    pub public_key_base64: String,
}

/// Deterministic provider for DIDs of method `prefix`.
#[derive(Clone, Debug)]
pub struct KelProvider {
    prefix: String,
}

impl Default for KelProvider {
    fn default() -> Self {
        Self::new("kel")
    }
}

impl KelProvider {
    /// Create a provider whose documents use `did:<prefix>:` DIDs.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Public key at rotation index `n` for `seed`.
    #[must_use]
    pub fn public_key(seed: &str, n: u64) -> String {
        digest(format!("{seed}/{n}").as_bytes())
    }

    /// Inception event and identifier for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be serialized.
    pub fn inception(seed: &str) -> Result<(Event, String)> {
        let key = Self::public_key(seed, 0);
        let id = digest(key.as_bytes());
        let icp = KelEvent {
            kind: "icp".into(),
            id: id.clone(),
            sn: 0,
            key,
            prior: None,
        };
        Ok((icp.to_event()?, id))
    }

    /// Rotation event extending `log` with the next key derived from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if `log` is empty or its last event is malformed.
    pub fn rotation(seed: &str, log: &[Event]) -> Result<Event> {
        let Some(last) = log.last() else {
            bail!("cannot rotate an empty log");
        };
        let previous = KelEvent::parse(last)?;
        let sn = previous.sn + 1;
        KelEvent {
            kind: "rot".into(),
            id: previous.id,
            sn,
            key: Self::public_key(seed, sn),
            prior: Some(digest(last.as_str().as_bytes())),
        }
        .to_event()
    }

    /// The full log for `seed` after `rotations` key rotations.
    ///
    /// # Errors
    ///
    /// Returns an error if an event cannot be serialized.
    pub fn log(seed: &str, rotations: usize) -> Result<Vec<Event>> {
        let (icp, _) = Self::inception(seed)?;
        let mut log = vec![icp];
        for _ in 0..rotations {
            log.push(Self::rotation(seed, &log)?);
        }
        Ok(log)
    }

    fn document(&self, state: &KelEvent) -> Document {
        let did = format!("did:{}:{}", self.prefix, state.id);
        let key_id = format!("{did}#key-{}", state.sn);
        Document {
            context: DID_CONTEXT.into(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                type_: "Ed25519VerificationKey2020".into(),
                controller: did.clone(),
                public_key_base64: state.key.clone(),
            }],
            authentication: vec![key_id],
            version_id: state.sn,
            id: did,
        }
    }
}

impl Validator for KelProvider {
    type Document = Document;

    async fn validate(&self, events: &[Event]) -> Result<Document> {
        let Some((first, rest)) = events.split_first() else {
            bail!("empty event log");
        };

        let mut state = KelEvent::parse(first)?;
        ensure!(state.kind == "icp", "first event must be an inception event");
        ensure!(state.sn == 0, "inception sequence number must be 0");
        ensure!(state.prior.is_none(), "inception event cannot have a prior event");
        ensure!(state.id == digest(state.key.as_bytes()), "identifier does not match inception key");

        let mut previous = first;
        for event in rest {
            let next = KelEvent::parse(event)?;
            ensure!(next.kind == "rot", "unexpected {} event at {}", next.kind, next.sn);
            ensure!(next.id == state.id, "event belongs to {}, not {}", next.id, state.id);
            ensure!(
                next.sn == state.sn + 1,
                "expected sequence number {}, got {}",
                state.sn + 1,
                next.sn
            );
            ensure!(
                next.prior.as_deref() == Some(digest(previous.as_str().as_bytes()).as_str()),
                "event {} does not commit to its prior event",
                next.sn
            );
            previous = event;
            state = next;
        }

        Ok(self.document(&state))
    }
}

impl IdExtractor for KelProvider {
    async fn extract_id(&self, event: &Event) -> Result<String> {
        Ok(KelEvent::parse(event)?.id)
    }
}

impl Creator for KelProvider {
    type Config = Seed;
    type KeyMaterial = Keys;

    async fn create(&self, config: Seed) -> Result<Inception<Keys>> {
        let Seed(seed) = config;
        ensure!(!seed.is_empty(), "seed must not be empty");

        let (event, id) = Self::inception(&seed)?;
        Ok(Inception {
            event,
            id,
            key_material: Keys {
                public: Self::public_key(&seed, 0),
                seed,
            },
        })
    }
}

fn digest(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(Sha256::digest(bytes).as_slice())
}
