//! Topology reconciliation engine between `labmend-api` and the CLI.
//!
//! This crate owns the domain model and the repair pipeline for the
//! labmend workspace:
//!
//! - **[`TopologyModel`]** — Immutable snapshot of observed lab state:
//!   name resolution, adjacency, per-node port occupancy, and the
//!   isolated-node set, built from one `(nodes, links)` fetch.
//!
//! - **[`DesiredStateCatalog`]** — Validated list of connections a
//!   healthy lab must have, expressed in device names with priorities
//!   and rationales.
//!
//! - **[`planner::plan`]** — Pure diff of catalog against snapshot,
//!   producing a [`RepairPlan`]: create actions in priority order,
//!   pre-satisfied entries, unresolvable names, isolated nodes.
//!
//! - **[`LinkApplier`]** — Sequential executor for the plan. Each
//!   action re-fetches occupancy, allocates ports deterministically
//!   ([`PortAllocator`]), submits the link, and verifies it by
//!   re-fetching. Conflicts rescan with exclusions; transient transport
//!   errors retry with backoff; every action ends in a typed outcome.
//!
//! - **[`engine::reconcile`]** — One-shot facade: observe, plan,
//!   apply, recount isolation, and assemble a
//!   [`ReconciliationReport`].

pub mod allocator;
pub mod applier;
pub mod catalog;
pub mod convert;
pub mod engine;
pub mod error;
pub mod model;
pub mod planner;
pub mod report;
pub mod topology;

// ── Primary re-exports ──────────────────────────────────────────────
pub use allocator::{Allocation, PortAllocator, SearchSpace};
pub use applier::{ApplierPolicy, LinkApplier};
pub use catalog::{CatalogError, DesiredConnection, DesiredStateCatalog, Priority};
pub use engine::{observe, reconcile};
pub use error::CoreError;
pub use planner::{CreateLinkAction, RepairPlan};
pub use report::{ConnectionOutcome, ConnectionReport, FailureReason, ReconciliationReport};
pub use topology::{NameLookup, TopologyModel};

// Re-export model types at the crate root for ergonomics.
pub use model::{Link, LinkEndpoint, LinkId, Node, NodeId, NodeKind, NodeStatus, PortAddress};
