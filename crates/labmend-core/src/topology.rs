//! In-memory snapshot of observed lab state.
//!
//! [`TopologyModel::build`] ingests one `(nodes, links)` fetch and
//! precomputes everything the planner asks repeatedly: name resolution,
//! node-pair adjacency, per-node port occupancy, and the isolated-node
//! set. The model is immutable; a fresh fetch produces a fresh model.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

use crate::model::{Link, Node, NodeId, PortAddress};

/// Resolution entry for one device name.
///
/// Controllers do not enforce unique names, so a name can map to more
/// than one node. Such names are kept, flagged, and refused at plan
/// time rather than silently collapsed onto one of the candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameEntry {
    Unique(NodeId),
    Ambiguous { count: usize },
}

/// Outcome of looking a device name up in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLookup<'a> {
    Found(&'a Node),
    Unknown,
    Ambiguous { count: usize },
}

#[derive(Debug, Clone)]
pub struct TopologyModel {
    nodes: BTreeMap<NodeId, Node>,
    by_name: HashMap<String, NameEntry>,
    adjacency: HashMap<NodeId, BTreeSet<NodeId>>,
    occupancy: HashMap<NodeId, BTreeSet<PortAddress>>,
    links: Vec<Link>,
}

impl TopologyModel {
    /// Build a model from one controller snapshot.
    ///
    /// Links whose endpoints reference a node absent from `nodes` are
    /// dropped with a warning; the two fetches are not transactional on
    /// the controller side, so a link can outlive its node by one poll.
    pub fn build(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut node_map = BTreeMap::new();
        let mut by_name: HashMap<String, NameEntry> = HashMap::new();

        for node in nodes {
            match by_name.get_mut(&node.name) {
                None => {
                    by_name.insert(node.name.clone(), NameEntry::Unique(node.id.clone()));
                }
                Some(entry) => {
                    let count = match entry {
                        NameEntry::Unique(_) => 2,
                        NameEntry::Ambiguous { count } => *count + 1,
                    };
                    warn!(name = %node.name, count, "duplicate device name in lab");
                    *entry = NameEntry::Ambiguous { count };
                }
            }
            node_map.insert(node.id.clone(), node);
        }

        let mut adjacency: HashMap<NodeId, BTreeSet<NodeId>> = HashMap::new();
        let mut occupancy: HashMap<NodeId, BTreeSet<PortAddress>> = HashMap::new();
        let mut kept_links = Vec::with_capacity(links.len());

        for link in links {
            if !node_map.contains_key(&link.a.node) || !node_map.contains_key(&link.b.node) {
                warn!(link_id = %link.id, "skipping link referencing a node absent from the snapshot");
                continue;
            }
            adjacency
                .entry(link.a.node.clone())
                .or_default()
                .insert(link.b.node.clone());
            adjacency
                .entry(link.b.node.clone())
                .or_default()
                .insert(link.a.node.clone());
            occupancy
                .entry(link.a.node.clone())
                .or_default()
                .insert(link.a.addr);
            occupancy
                .entry(link.b.node.clone())
                .or_default()
                .insert(link.b.addr);
            kept_links.push(link);
        }

        Self {
            nodes: node_map,
            by_name,
            adjacency,
            occupancy,
            links: kept_links,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, ordered by identifier.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Resolve a device name to a node, surfacing ambiguity.
    pub fn resolve(&self, name: &str) -> NameLookup<'_> {
        match self.by_name.get(name) {
            None => NameLookup::Unknown,
            Some(NameEntry::Ambiguous { count }) => NameLookup::Ambiguous { count: *count },
            Some(NameEntry::Unique(id)) => match self.nodes.get(id) {
                Some(node) => NameLookup::Found(node),
                None => NameLookup::Unknown,
            },
        }
    }

    /// Whether at least one link joins the two nodes, in either order.
    pub fn has_edge(&self, a: &NodeId, b: &NodeId) -> bool {
        self.adjacency.get(a).is_some_and(|peers| peers.contains(b))
    }

    /// Number of distinct neighbors of a node.
    pub fn degree(&self, id: &NodeId) -> usize {
        self.adjacency.get(id).map_or(0, BTreeSet::len)
    }

    /// Port addresses already cabled on a node, in allocation scan order.
    pub fn occupied_ports(&self, id: &NodeId) -> Option<&BTreeSet<PortAddress>> {
        self.occupancy.get(id)
    }

    /// Started, non-bridge nodes with no links at all, ordered by name.
    ///
    /// Stopped and suspended nodes are expected to be unwired spares, and
    /// bridge nodes are often standalone by design; neither is flagged.
    pub fn isolated_nodes(&self) -> Vec<&Node> {
        let mut isolated: Vec<&Node> = self
            .nodes
            .values()
            .filter(|node| self.degree(&node.id) == 0 && node.isolation_relevant())
            .collect();
        isolated.sort_by(|x, y| x.name.cmp(&y.name));
        isolated
    }
}

/// Collect the port addresses a node uses across a raw link list.
///
/// The applier works from freshly fetched links rather than a full
/// model rebuild, so this helper exists independently of
/// [`TopologyModel`].
pub fn ports_in_use(links: &[Link], node: &NodeId) -> BTreeSet<PortAddress> {
    let mut used = BTreeSet::new();
    for link in links {
        if &link.a.node == node {
            used.insert(link.a.addr);
        }
        if &link.b.node == node {
            used.insert(link.b.addr);
        }
    }
    used
}
