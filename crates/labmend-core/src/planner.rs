//! Diffing desired state against the observed topology.
//!
//! Planning is pure: it never talks to the controller and never
//! mutates anything. The output is a [`RepairPlan`] whose create
//! actions are ordered by descending priority, catalog order breaking
//! ties, which is exactly the order the applier executes them in.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{DesiredConnection, DesiredStateCatalog};
use crate::model::{Node, NodeId};
use crate::report::FailureReason;
use crate::topology::{NameLookup, TopologyModel};

/// One missing edge the applier should create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateLinkAction {
    pub connection: DesiredConnection,
    pub a: NodeId,
    pub b: NodeId,
}

/// Everything the reconciler decided about one snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepairPlan {
    /// Missing edges, highest priority first.
    pub actions: Vec<CreateLinkAction>,
    /// Catalog entries whose edge already exists.
    pub pre_satisfied: Vec<DesiredConnection>,
    /// Catalog entries that cannot be acted on with this snapshot.
    pub unresolvable: Vec<(DesiredConnection, FailureReason)>,
    /// Isolated nodes observed at plan time, for reporting only.
    /// Reconciliation never invents connections for them.
    pub isolated: Vec<Node>,
}

impl RepairPlan {
    /// True when there is nothing to send to the controller.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} to repair, {} already satisfied, {} unresolvable, {} isolated",
            self.actions.len(),
            self.pre_satisfied.len(),
            self.unresolvable.len(),
            self.isolated.len()
        )
    }
}

fn resolve(model: &TopologyModel, name: &str) -> Result<NodeId, FailureReason> {
    match model.resolve(name) {
        NameLookup::Found(node) => Ok(node.id.clone()),
        NameLookup::Unknown => Err(FailureReason::UnknownDevice),
        NameLookup::Ambiguous { .. } => Err(FailureReason::AmbiguousDevice),
    }
}

/// Compare the catalog against an observed snapshot.
pub fn plan(model: &TopologyModel, catalog: &DesiredStateCatalog) -> RepairPlan {
    let mut out = RepairPlan {
        isolated: model.isolated_nodes().into_iter().cloned().collect(),
        ..RepairPlan::default()
    };

    for conn in catalog.connections() {
        let a = match resolve(model, &conn.a) {
            Ok(id) => id,
            Err(reason) => {
                debug!(connection = %conn.label(), device = %conn.a, %reason, "unresolvable");
                out.unresolvable.push((conn.clone(), reason));
                continue;
            }
        };
        let b = match resolve(model, &conn.b) {
            Ok(id) => id,
            Err(reason) => {
                debug!(connection = %conn.label(), device = %conn.b, %reason, "unresolvable");
                out.unresolvable.push((conn.clone(), reason));
                continue;
            }
        };

        if model.has_edge(&a, &b) {
            debug!(connection = %conn.label(), "already satisfied");
            out.pre_satisfied.push(conn.clone());
        } else {
            debug!(connection = %conn.label(), priority = %conn.priority, "missing edge");
            out.actions.push(CreateLinkAction {
                connection: conn.clone(),
                a,
                b,
            });
        }
    }

    // Stable sort: ties keep catalog order.
    out.actions
        .sort_by(|x, y| y.connection.priority.cmp(&x.connection.priority));

    out
}
