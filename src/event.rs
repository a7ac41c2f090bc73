//! # Events
//!
//! An [`Event`] is a single signed entry in a key event log. The payload is
//! opaque to this crate: events are compared, stored and handed to delegates
//! as atomic strings and are never parsed or reordered.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// An ordered sequence of events belonging to one identifier.
pub type EventLog = Vec<Event>;

/// A single, serialized key event.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Event(String);

impl Event {
    /// Create an event from its serialized payload.
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// The serialized payload.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the event, returning its payload.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Event {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Event {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Event {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Events in `incoming` that are not already present in `previous`.
///
/// Equality is exact content equality. The caller's order is preserved and an
/// event repeated within `incoming` is only returned once, so appending the
/// result to `previous` never produces a log with duplicate entries.
#[must_use]
pub fn new_events(previous: &[Event], incoming: &[Event]) -> EventLog {
    let mut seen: HashSet<&Event> = previous.iter().collect();
    incoming.iter().filter(|event| seen.insert(*event)).cloned().collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn log(payloads: &[&str]) -> EventLog {
        payloads.iter().map(|p| Event::from(*p)).collect()
    }

    #[test]
    fn nothing_stored() {
        let incoming = log(&["icp", "rot-1"]);
        assert_eq!(new_events(&[], &incoming), incoming);
    }

    #[test]
    fn already_stored() {
        let stored = log(&["icp", "rot-1"]);
        assert!(new_events(&stored, &stored).is_empty());
    }

    #[test]
    fn extends_stored() {
        let stored = log(&["icp"]);
        let incoming = log(&["icp", "rot-1", "rot-2"]);
        assert_eq!(new_events(&stored, &incoming), log(&["rot-1", "rot-2"]));
    }

    #[test]
    fn keeps_caller_order() {
        let stored = log(&["icp"]);
        let incoming = log(&["rot-2", "icp", "rot-1"]);
        assert_eq!(new_events(&stored, &incoming), log(&["rot-2", "rot-1"]));
    }

    #[test]
    fn collapses_repeats() {
        let incoming = log(&["icp", "icp", "rot-1", "icp"]);
        assert_eq!(new_events(&[], &incoming), log(&["icp", "rot-1"]));
    }

    #[test]
    fn serializes_as_string() {
        let event = Event::new("{\"sn\":0}");
        let json = serde_json::to_string(&event).expect("should serialize");
        assert_eq!(json, r#""{\"sn\":0}""#);
    }
}
