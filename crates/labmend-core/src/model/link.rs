// ── Link domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{LinkId, NodeId};

/// A physical attachment point on a node: adapter slot plus port index.
///
/// Ordering is adapter-major, port-minor, which makes a sorted set of
/// addresses enumerate exactly in allocation scan order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PortAddress {
    pub adapter: u32,
    pub port: u32,
}

impl PortAddress {
    pub fn new(adapter: u32, port: u32) -> Self {
        Self { adapter, port }
    }
}

impl fmt::Display for PortAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.adapter, self.port)
    }
}

/// One side of a link: which node, and where on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEndpoint {
    pub node: NodeId,
    pub addr: PortAddress,
}

impl LinkEndpoint {
    pub fn new(node: impl Into<NodeId>, adapter: u32, port: u32) -> Self {
        Self {
            node: node.into(),
            addr: PortAddress::new(adapter, port),
        }
    }
}

/// An undirected point-to-point cable between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub a: LinkEndpoint,
    pub b: LinkEndpoint,
}

impl Link {
    /// Whether this link joins the two given nodes, in either order.
    pub fn connects(&self, x: &NodeId, y: &NodeId) -> bool {
        (&self.a.node == x && &self.b.node == y) || (&self.a.node == y && &self.b.node == x)
    }

    /// The endpoint on `node`, if this link touches it.
    pub fn endpoint_on(&self, node: &NodeId) -> Option<&LinkEndpoint> {
        if &self.a.node == node {
            Some(&self.a)
        } else if &self.b.node == node {
            Some(&self.b)
        } else {
            None
        }
    }
}
