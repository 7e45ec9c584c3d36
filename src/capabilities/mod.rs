//! Client capability detection.
//!
//! # Data Flow
//! ```text
//! User-Agent header
//!     → CapabilityDetector::detect (pluggable strategy)
//!     → CapabilitySet (immutable, per request)
//!     → BuildCatalog::find_build
//! ```
//!
//! # Design Decisions
//! - Detection is total: any input yields a set, possibly empty
//! - Values are not limited to flags so requirements can match on
//!   browser family or version as well
//! - Any `Fn(&str) -> CapabilitySet` is a detector

pub mod browser;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use browser::BrowserCapabilities;

/// Value recorded for a single capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl CapabilityValue {
    /// Whether this value counts as "present" for a bare capability check.
    pub fn is_truthy(&self) -> bool {
        match self {
            CapabilityValue::Flag(b) => *b,
            CapabilityValue::Number(n) => *n != 0.0,
            CapabilityValue::Text(s) => !s.is_empty(),
        }
    }
}

impl From<bool> for CapabilityValue {
    fn from(value: bool) -> Self {
        CapabilityValue::Flag(value)
    }
}

impl From<f64> for CapabilityValue {
    fn from(value: f64) -> Self {
        CapabilityValue::Number(value)
    }
}

impl From<&str> for CapabilityValue {
    fn from(value: &str) -> Self {
        CapabilityValue::Text(value.to_string())
    }
}

impl From<String> for CapabilityValue {
    fn from(value: String) -> Self {
        CapabilityValue::Text(value)
    }
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityValue::Flag(b) => write!(f, "{}", b),
            CapabilityValue::Number(n) => write!(f, "{}", n),
            CapabilityValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// The features a client is known or assumed to support.
///
/// Produced once per request and never mutated afterwards; the builder
/// methods consume `self` so a finished set can be shared by reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilitySet {
    values: BTreeMap<String, CapabilityValue>,
}

impl CapabilitySet {
    /// An empty set. Only builds with no requirements match it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a capability value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CapabilityValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add a set of flags, all `true`.
    pub fn with_flags<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        for name in names {
            self.values.insert(name.into(), CapabilityValue::Flag(true));
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityValue> {
        self.values.get(name)
    }

    /// True when the capability exists and its value is truthy.
    pub fn has(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(CapabilityValue::is_truthy)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilityValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<N: Into<String>, V: Into<CapabilityValue>> FromIterator<(N, V)> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// Strategy mapping a client identity string to its capabilities.
///
/// Implementations must be total: empty or malformed input returns an
/// (often empty) set and never panics.
pub trait CapabilityDetector: Send + Sync + 'static {
    fn detect(&self, user_agent: &str) -> CapabilitySet;
}

impl<F> CapabilityDetector for F
where
    F: Fn(&str) -> CapabilitySet + Send + Sync + 'static,
{
    fn detect(&self, user_agent: &str) -> CapabilitySet {
        self(user_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_of_values() {
        assert!(CapabilityValue::Flag(true).is_truthy());
        assert!(!CapabilityValue::Flag(false).is_truthy());
        assert!(CapabilityValue::Number(2.0).is_truthy());
        assert!(!CapabilityValue::Number(0.0).is_truthy());
        assert!(CapabilityValue::from("safari").is_truthy());
        assert!(!CapabilityValue::from("").is_truthy());
    }

    #[test]
    fn has_requires_truthy_value() {
        let caps = CapabilitySet::new()
            .with("push", true)
            .with("modules", false)
            .with_flags(["es2015"]);

        assert!(caps.has("push"));
        assert!(caps.has("es2015"));
        assert!(!caps.has("modules"));
        assert!(!caps.has("serviceworker"));
        assert_eq!(caps.len(), 3);
    }

    #[test]
    fn closures_are_detectors() {
        let detector = |ua: &str| {
            if ua.contains("Modern") {
                CapabilitySet::new().with_flags(["modules"])
            } else {
                CapabilitySet::new()
            }
        };

        assert!(detector.detect("Modern/1.0").has("modules"));
        assert!(detector.detect("").is_empty());
    }

    #[test]
    fn values_deserialize_untagged() {
        let v: CapabilityValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, CapabilityValue::Flag(true));
        let v: CapabilityValue = serde_json::from_str("61").unwrap();
        assert_eq!(v, CapabilityValue::Number(61.0));
        let v: CapabilityValue = serde_json::from_str("\"chromium\"").unwrap();
        assert_eq!(v, CapabilityValue::Text("chromium".into()));
    }
}
