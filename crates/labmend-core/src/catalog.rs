//! Desired-state catalog: the connections a healthy lab must have.
//!
//! The catalog speaks in device *names* on purpose. Labs are rebuilt
//! and re-imported constantly, which churns controller identifiers,
//! while names are the stable operator-facing handle. Resolution to
//! identifiers happens against a live snapshot at plan time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How urgent a missing connection is.
///
/// Ordering is derived from variant order; `Critical` sorts greatest.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// One required connection between two named devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredConnection {
    pub a: String,
    pub b: String,
    pub priority: Priority,
    /// Free-text operator note carried through to the report.
    pub rationale: String,
}

impl DesiredConnection {
    /// Order-insensitive key for duplicate detection and report ordering.
    pub(crate) fn pair_key(&self) -> (&str, &str) {
        if self.a <= self.b {
            (&self.a, &self.b)
        } else {
            (&self.b, &self.a)
        }
    }

    /// `"SW-LAN <-> PC1"`, for logs and report lines.
    pub fn label(&self) -> String {
        format!("{} <-> {}", self.a, self.b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("connection #{index} joins \"{name}\" to itself")]
    SelfLoop { index: usize, name: String },

    #[error("connection \"{a} <-> {b}\" appears more than once")]
    DuplicatePair { a: String, b: String },

    #[error("connection #{index} has an empty device name")]
    EmptyName { index: usize },
}

/// A validated, ordered set of desired connections.
///
/// Validation happens once at construction: no self-loops, no blank
/// names, no repeated unordered pair. Catalog order is preserved and
/// meaningful; it breaks priority ties during planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredStateCatalog {
    connections: Vec<DesiredConnection>,
}

impl DesiredStateCatalog {
    pub fn new(connections: Vec<DesiredConnection>) -> Result<Self, CatalogError> {
        let mut seen: Vec<(String, String)> = Vec::with_capacity(connections.len());
        for (index, conn) in connections.iter().enumerate() {
            if conn.a.trim().is_empty() || conn.b.trim().is_empty() {
                return Err(CatalogError::EmptyName { index });
            }
            if conn.a == conn.b {
                return Err(CatalogError::SelfLoop {
                    index,
                    name: conn.a.clone(),
                });
            }
            let (ka, kb) = conn.pair_key();
            let key = (ka.to_owned(), kb.to_owned());
            if seen.contains(&key) {
                return Err(CatalogError::DuplicatePair { a: key.0, b: key.1 });
            }
            seen.push(key);
        }
        Ok(Self { connections })
    }

    pub fn connections(&self) -> &[DesiredConnection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Every device name the catalog mentions, deduplicated, in first
    /// appearance order.
    pub fn device_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for conn in &self.connections {
            for name in [conn.a.as_str(), conn.b.as_str()] {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}
