// Wire types for the controller's JSON payloads.
//
// The controller returns far more per node/link (console ports, symbol
// paths, capture state, …) than reconciliation needs; only the fields the
// engine consumes are deserialized, everything else is ignored.

use serde::{Deserialize, Serialize};

/// One node as returned by `GET projects/{id}/nodes`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub node_id: String,
    pub name: String,
    /// Device category tag, e.g. `ethernet_switch`, `dynamips`, `qemu`, `cloud`.
    pub node_type: String,
    /// Lifecycle state: `started`, `stopped`, or `suspended`.
    pub status: String,
}

/// One endpoint of a link: a node plus its `(adapter, port)` address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEndpointRecord {
    pub node_id: String,
    pub adapter_number: u32,
    pub port_number: u32,
}

/// One link as returned by `GET projects/{id}/links`.
///
/// The controller models links as a `nodes` array; in practice it always
/// holds exactly two endpoints, but the wire shape does not promise that,
/// so conversion into the domain `Link` validates the arity.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkRecord {
    pub link_id: String,
    pub nodes: Vec<LinkEndpointRecord>,
}

/// Request body for `POST projects/{id}/links`.
#[derive(Debug, Clone, Serialize)]
pub struct LinkCreateRequest {
    pub nodes: [LinkEndpointRecord; 2],
}

impl LinkCreateRequest {
    pub fn new(a: LinkEndpointRecord, b: LinkEndpointRecord) -> Self {
        Self { nodes: [a, b] }
    }
}

/// Response of `GET version` — used as a connectivity probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    #[serde(default)]
    pub local: bool,
}
