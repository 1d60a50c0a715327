//! One-shot reconciliation runs.
//!
//! [`reconcile`] wires the stages together: snapshot, plan, apply,
//! recount, report. Each invocation is self-contained; callers that
//! want periodic repair loop outside and get a fresh snapshot every
//! time, which is what keeps runs reproducible.

use std::collections::HashMap;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use labmend_api::ControllerClient;

use crate::applier::{ApplierPolicy, LinkApplier};
use crate::catalog::DesiredStateCatalog;
use crate::convert::link_from_record;
use crate::error::CoreError;
use crate::model::{Link, Node};
use crate::planner;
use crate::report::{ConnectionReport, ReconciliationReport};
use crate::topology::TopologyModel;

/// Fetch one snapshot and build the topology model from it.
///
/// Nodes and links are read sequentially; a failure in either read is
/// fatal because a partial baseline cannot be planned against.
pub async fn observe(client: &ControllerClient) -> Result<TopologyModel, CoreError> {
    let nodes = client
        .list_nodes()
        .await
        .map_err(|source| CoreError::BaselineUnavailable { source })?;
    let links = client
        .list_links()
        .await
        .map_err(|source| CoreError::BaselineUnavailable { source })?;

    let nodes: Vec<Node> = nodes.into_iter().map(Node::from).collect();
    let links: Vec<Link> = links.into_iter().filter_map(link_from_record).collect();
    Ok(TopologyModel::build(nodes, links))
}

/// Run one full reconciliation: observe, plan, repair, re-observe.
///
/// Fails only when the baseline snapshot cannot be read. Every other
/// problem lands in the report as a per-connection outcome, and partial
/// repair is expected: links created before an error or cancellation
/// stay in place.
pub async fn reconcile(
    client: &ControllerClient,
    catalog: &DesiredStateCatalog,
    policy: ApplierPolicy,
    cancel: &CancellationToken,
) -> Result<ReconciliationReport, CoreError> {
    let started_at = Utc::now();
    info!(
        project = client.project_id(),
        connections = catalog.len(),
        "reconciliation started"
    );

    let model = observe(client).await?;
    let plan = planner::plan(&model, catalog);
    info!(summary = %plan.summary(), "plan computed");

    let had_actions = !plan.is_noop();
    let plan_isolated = plan.isolated.clone();

    let applier = LinkApplier::new(client, policy);
    let mut connections = applier.apply(plan, cancel).await;
    restore_catalog_order(&mut connections, catalog);

    // Recount isolation only if the controller may have been mutated;
    // an untouched lab still matches the plan-time snapshot.
    let still_isolated = if had_actions {
        match observe(client).await {
            Ok(fresh) => fresh.isolated_nodes().into_iter().cloned().collect(),
            Err(err) => {
                warn!(error = %err, "post-repair recount failed; reporting plan-time isolation");
                plan_isolated
            }
        }
    } else {
        plan_isolated
    };

    let report = ReconciliationReport {
        started_at,
        finished_at: Utc::now(),
        connections,
        still_isolated,
    };
    info!(summary = %report.summary(), "reconciliation finished");
    Ok(report)
}

/// Put report entries back into catalog order.
///
/// The applier walks actions in priority order, but the report reads
/// best as a line-for-line mirror of the operator's catalog file.
fn restore_catalog_order(reports: &mut [ConnectionReport], catalog: &DesiredStateCatalog) {
    let order: HashMap<(&str, &str), usize> = catalog
        .connections()
        .iter()
        .enumerate()
        .map(|(index, conn)| (conn.pair_key(), index))
        .collect();
    reports.sort_by_key(|r| {
        order
            .get(&r.connection.pair_key())
            .copied()
            .unwrap_or(usize::MAX)
    });
}
