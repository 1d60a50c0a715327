// ── Strongly-typed identifiers ──
//
// Controller-assigned identifiers are opaque strings (UUIDs on every
// controller generation we target, but nothing here depends on that).
// Newtypes keep node and link identifiers from being mixed up in maps
// and function signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque controller-assigned identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// Opaque controller-assigned identifier for a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LinkId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for LinkId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn node_id_round_trips_through_display() {
        let id = NodeId::new("e581f562-57e9-4e4a-9a29-2f4e1f3184ad");
        assert_eq!(id.to_string(), "e581f562-57e9-4e4a-9a29-2f4e1f3184ad");
        assert_eq!(NodeId::from(id.as_str()), id);
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = LinkId::new("ab5c4c56-11e8-4a3f-bb0a-9f936e0cc1b1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""ab5c4c56-11e8-4a3f-bb0a-9f936e0cc1b1""#);
        let back: LinkId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
