//! Reconciliation outcomes and the end-of-run report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::DesiredConnection;
use crate::model::{LinkId, Node, PortAddress};

/// Why a desired connection could not be repaired.
///
/// The display strings are stable and operator-facing; scripts grep
/// them out of reports, so changing one is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    #[strum(serialize = "unknown device")]
    UnknownDevice,
    #[strum(serialize = "ambiguous device name")]
    AmbiguousDevice,
    #[strum(serialize = "no usable port after retries")]
    NoUsablePort,
    #[strum(serialize = "controller unreachable")]
    ControllerUnreachable,
    #[strum(serialize = "verification timeout")]
    VerificationTimeout,
    #[strum(serialize = "cancelled")]
    Cancelled,
}

/// Terminal state of one desired connection after a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionOutcome {
    /// The edge already existed; nothing was sent to the controller.
    AlreadySatisfied,
    /// A link was created and verified. Ports are reported in the same
    /// order as the connection's device names.
    Repaired {
        link: LinkId,
        a_port: PortAddress,
        b_port: PortAddress,
    },
    Failed {
        reason: FailureReason,
    },
}

impl ConnectionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One desired connection paired with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub connection: DesiredConnection,
    pub outcome: ConnectionOutcome,
}

impl ConnectionReport {
    /// One-line audit entry, e.g.
    /// `SW-LAN[0/1] <-> PC1[0/0]  repaired (critical)`.
    pub fn audit_line(&self) -> String {
        let conn = &self.connection;
        match &self.outcome {
            ConnectionOutcome::AlreadySatisfied => {
                format!("{} <-> {}  ok ({})", conn.a, conn.b, conn.priority)
            }
            ConnectionOutcome::Repaired { a_port, b_port, .. } => format!(
                "{}[{a_port}] <-> {}[{b_port}]  repaired ({})",
                conn.a, conn.b, conn.priority
            ),
            ConnectionOutcome::Failed { reason } => {
                format!("{} <-> {}  FAILED: {reason} ({})", conn.a, conn.b, conn.priority)
            }
        }
    }
}

/// Full account of one reconciliation run.
///
/// Every catalog entry appears exactly once, in catalog order, whatever
/// its outcome. `still_isolated` is recounted from a fresh snapshot
/// taken after repairs.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub connections: Vec<ConnectionReport>,
    pub still_isolated: Vec<Node>,
}

impl ReconciliationReport {
    pub fn satisfied_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|r| matches!(r.outcome, ConnectionOutcome::AlreadySatisfied))
            .count()
    }

    pub fn repaired_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|r| matches!(r.outcome, ConnectionOutcome::Repaired { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    /// Whether any desired connection ended in `Failed`. Drives the
    /// process exit status of `apply`.
    pub fn has_failures(&self) -> bool {
        self.connections.iter().any(|r| r.outcome.is_failure())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConnectionReport> {
        self.connections.iter().filter(|r| r.outcome.is_failure())
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// `"2 repaired, 1 ok, 1 failed, 3 still isolated"`.
    pub fn summary(&self) -> String {
        format!(
            "{} repaired, {} ok, {} failed, {} still isolated",
            self.repaired_count(),
            self.satisfied_count(),
            self.failed_count(),
            self.still_isolated.len()
        )
    }
}
