// ── API-to-domain type conversions ──
//
// Bridges raw `labmend_api` response types into canonical
// `labmend_core::model` domain types. Conversions are lossy on purpose:
// the engine only needs identity, category, status, and wiring, so
// everything else on the wire is dropped here.

use labmend_api::types::{LinkRecord, NodeRecord};
use tracing::warn;

use crate::model::{Link, LinkEndpoint, LinkId, Node, NodeId, NodeKind, NodeStatus, PortAddress};

impl From<NodeRecord> for Node {
    fn from(raw: NodeRecord) -> Self {
        Node {
            id: NodeId::from(raw.node_id),
            name: raw.name,
            kind: NodeKind::from_node_type(&raw.node_type),
            status: NodeStatus::from_wire(&raw.status),
        }
    }
}

/// Convert a raw link record, or drop it when it is not point-to-point.
///
/// Controllers model every cable as exactly two endpoints; a record with
/// any other arity is either corrupt or a future multi-point construct
/// we do not reason about. Dropping it keeps the rest of the snapshot
/// usable.
pub fn link_from_record(raw: LinkRecord) -> Option<Link> {
    let [ea, eb]: [labmend_api::types::LinkEndpointRecord; 2] = match raw.nodes.try_into() {
        Ok(pair) => pair,
        Err(nodes) => {
            warn!(
                link_id = %raw.link_id,
                endpoints = nodes.len(),
                "skipping link with non-point-to-point endpoint count"
            );
            return None;
        }
    };

    Some(Link {
        id: LinkId::from(raw.link_id),
        a: LinkEndpoint {
            node: NodeId::from(ea.node_id),
            addr: PortAddress::new(ea.adapter_number, ea.port_number),
        },
        b: LinkEndpoint {
            node: NodeId::from(eb.node_id),
            addr: PortAddress::new(eb.adapter_number, eb.port_number),
        },
    })
}
