//! Desired-state catalog files.
//!
//! A catalog is a TOML file of `[[connection]]` tables:
//!
//! ```toml
//! [[connection]]
//! a = "SW-LAN"
//! b = "PC1"
//! priority = "high"
//! rationale = "management path for scan agents"
//! ```
//!
//! `priority` defaults to `medium` and `rationale` to empty. Validation
//! (self-loops, duplicate pairs, blank names) happens in
//! `labmend_core::DesiredStateCatalog`.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use labmend_core::{DesiredConnection, DesiredStateCatalog, Priority};

use crate::ConfigError;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "connection")]
    connections: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    a: String,
    b: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    rationale: String,
}

impl From<CatalogEntry> for DesiredConnection {
    fn from(entry: CatalogEntry) -> Self {
        DesiredConnection {
            a: entry.a,
            b: entry.b,
            priority: entry.priority,
            rationale: entry.rationale,
        }
    }
}

/// Load and validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<DesiredStateCatalog, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CatalogFile = toml::from_str(&raw).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), entries = file.connections.len(), "catalog loaded");

    let connections = file
        .connections
        .into_iter()
        .map(DesiredConnection::from)
        .collect();
    Ok(DesiredStateCatalog::new(connections)?)
}
