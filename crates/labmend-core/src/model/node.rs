// ── Node domain types ──

use serde::{Deserialize, Serialize};

use super::id::NodeId;

/// Canonical device category, normalized from the controller's emulator tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[non_exhaustive]
pub enum NodeKind {
    Switch,
    Router,
    Host,
    CloudBridge,
    Appliance,
    Other,
}

impl NodeKind {
    /// Map the controller's `node_type` tag to a canonical category.
    ///
    /// Tags follow the GNS3 emulator vocabulary: `ethernet_switch`,
    /// `dynamips`, `vpcs`, `cloud`, `docker`, and friends. Unrecognized
    /// tags land in `Other` rather than failing the snapshot.
    pub fn from_node_type(tag: &str) -> Self {
        match tag {
            "ethernet_switch" | "ethernet_hub" | "atm_switch" | "frame_relay_switch" => {
                Self::Switch
            }
            "dynamips" | "iou" => Self::Router,
            "vpcs" | "qemu" | "virtualbox" | "vmware" => Self::Host,
            "cloud" | "nat" => Self::CloudBridge,
            "docker" => Self::Appliance,
            _ => Self::Other,
        }
    }

    /// Bridge kinds connect the lab to the outside world and are often
    /// deliberately unwired; they are exempt from isolation flagging.
    pub fn is_bridge(&self) -> bool {
        matches!(self, Self::CloudBridge)
    }
}

/// Node operational status as reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum NodeStatus {
    Started,
    Stopped,
    Suspended,
    Unknown,
}

impl NodeStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "started" => Self::Started,
            "stopped" => Self::Stopped,
            "suspended" => Self::Suspended,
            _ => Self::Unknown,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

/// A device in the lab topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub status: NodeStatus,
}

impl Node {
    /// Whether this node should be flagged when it has no links at all.
    ///
    /// Powered-off or suspended spares are expected to be unwired, and
    /// bridge nodes are frequently standalone by design; only a started
    /// non-bridge device with zero links is worth an operator's
    /// attention.
    pub fn isolation_relevant(&self) -> bool {
        self.status.is_started() && !self.kind.is_bridge()
    }
}
