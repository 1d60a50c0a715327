//! Canonical domain types for the lab topology.
//!
//! Everything here is controller-agnostic: wire records from
//! `labmend-api` are normalized into these types by [`crate::convert`]
//! and never leak past it.

pub mod id;
pub mod link;
pub mod node;

pub use id::{LinkId, NodeId};
pub use link::{Link, LinkEndpoint, PortAddress};
pub use node::{Node, NodeKind, NodeStatus};
