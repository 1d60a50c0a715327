//! Executing a repair plan against the controller.
//!
//! Each create action walks a small state machine: re-fetch occupancy,
//! allocate a port on both endpoints, submit, then verify by re-fetch.
//! A port conflict re-enters allocation with the rejected ports
//! excluded; transient transport errors retry in place with backoff.
//! Failures never abort the run: every action ends in a terminal
//! outcome and the next action proceeds.
//!
//! The applier is strictly sequential. Repairs mutate shared port
//! state, and two concurrent creates against one switch would race
//! each other's occupancy snapshots.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use labmend_api::types::{LinkCreateRequest, LinkEndpointRecord};
use labmend_api::{ControllerClient, Error as ApiError};

use crate::allocator::{PortAllocator, SearchSpace};
use crate::convert::link_from_record;
use crate::model::{Link, NodeId, PortAddress};
use crate::planner::{CreateLinkAction, RepairPlan};
use crate::report::{ConnectionOutcome, ConnectionReport, FailureReason};
use crate::topology::ports_in_use;

/// Caps the exponential backoff multiplier at `base * 2^6`.
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Retry and timing knobs for the applier.
#[derive(Debug, Clone)]
pub struct ApplierPolicy {
    /// Port region scanned before degraded extension kicks in.
    pub search_space: SearchSpace,
    /// Allocation rounds per action. Each round re-fetches occupancy,
    /// so two rounds means one rescan after a port conflict.
    pub max_port_attempts: u32,
    /// Attempts per controller call for transient transport failures.
    pub max_transport_retries: u32,
    /// First retry delay; doubles per attempt.
    pub backoff_base: Duration,
    /// Pause before the single verification re-check.
    pub verify_recheck_delay: Duration,
}

impl Default for ApplierPolicy {
    fn default() -> Self {
        Self {
            search_space: SearchSpace::default(),
            max_port_attempts: 2,
            max_transport_retries: 3,
            backoff_base: Duration::from_millis(500),
            verify_recheck_delay: Duration::from_secs(2),
        }
    }
}

impl ApplierPolicy {
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.backoff_base * (1u32 << shift)
    }
}

/// How a retried controller call ultimately ended.
enum CallError {
    /// Run cancellation observed while waiting.
    Cancelled,
    /// Transient failures exhausted the retry budget.
    Exhausted(ApiError),
    /// The controller answered with a non-transient refusal.
    Rejected(ApiError),
}

/// Whether a create refusal means "this port pick was bad, try another".
///
/// Covers explicit conflicts (the port was taken between snapshot and
/// submit) and plain 400s, which controllers return for out-of-range
/// addresses such as an extension past a node's real slot count.
fn is_port_rejection(err: &ApiError) -> bool {
    err.is_conflict() || matches!(err, ApiError::Controller { status: 400, .. })
}

/// Run a future unless the token fires first.
async fn guard<T>(cancel: &CancellationToken, fut: impl Future<Output = T>) -> Option<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

pub struct LinkApplier<'a> {
    client: &'a ControllerClient,
    policy: ApplierPolicy,
}

impl<'a> LinkApplier<'a> {
    pub fn new(client: &'a ControllerClient, policy: ApplierPolicy) -> Self {
        Self { client, policy }
    }

    /// Execute every action in the plan, sequentially, in plan order.
    ///
    /// Returns one report entry per catalog connection: pre-satisfied
    /// and unresolvable entries pass through unchanged, actions get the
    /// outcome the state machine reached. Once cancellation fires, all
    /// remaining actions resolve as cancelled without controller calls.
    pub async fn apply(
        &self,
        plan: RepairPlan,
        cancel: &CancellationToken,
    ) -> Vec<ConnectionReport> {
        let mut reports = Vec::with_capacity(
            plan.pre_satisfied.len() + plan.unresolvable.len() + plan.actions.len(),
        );

        for conn in plan.pre_satisfied {
            reports.push(ConnectionReport {
                connection: conn,
                outcome: ConnectionOutcome::AlreadySatisfied,
            });
        }
        for (conn, reason) in plan.unresolvable {
            reports.push(ConnectionReport {
                connection: conn,
                outcome: ConnectionOutcome::Failed { reason },
            });
        }

        for action in plan.actions {
            let outcome = if cancel.is_cancelled() {
                debug!(connection = %action.connection.label(), "skipped after cancellation");
                ConnectionOutcome::Failed {
                    reason: FailureReason::Cancelled,
                }
            } else {
                self.apply_action(&action, cancel).await
            };
            if let ConnectionOutcome::Failed { reason } = &outcome {
                warn!(connection = %action.connection.label(), %reason, "repair failed");
            }
            reports.push(ConnectionReport {
                connection: action.connection,
                outcome,
            });
        }

        reports
    }

    /// Drive one create action to a terminal outcome.
    async fn apply_action(
        &self,
        action: &CreateLinkAction,
        cancel: &CancellationToken,
    ) -> ConnectionOutcome {
        let label = action.connection.label();
        debug!(connection = %label, "repairing");

        let mut alloc_a = PortAllocator::new(self.policy.search_space);
        let mut alloc_b = PortAllocator::new(self.policy.search_space);

        for round in 1..=self.policy.max_port_attempts {
            // Occupancy must be read fresh for every allocation round:
            // earlier actions in this run (or anything else driving the
            // controller) may have consumed ports since the last look.
            let links = match self.fetch_links(cancel).await {
                Ok(links) => links,
                Err(CallError::Cancelled) => return failed(FailureReason::Cancelled),
                Err(CallError::Exhausted(_) | CallError::Rejected(_)) => {
                    return failed(FailureReason::ControllerUnreachable);
                }
            };

            // The edge may have appeared since planning; creating again
            // would duplicate it.
            if links.iter().any(|l| l.connects(&action.a, &action.b)) {
                debug!(connection = %label, "edge appeared since planning");
                return ConnectionOutcome::AlreadySatisfied;
            }

            let occupied_a = ports_in_use(&links, &action.a);
            let occupied_b = ports_in_use(&links, &action.b);

            let Some(pick_a) = alloc_a.next_free(&occupied_a) else {
                return failed(FailureReason::NoUsablePort);
            };
            let Some(pick_b) = alloc_b.next_free(&occupied_b) else {
                return failed(FailureReason::NoUsablePort);
            };
            for (name, pick) in [(&action.connection.a, pick_a), (&action.connection.b, pick_b)] {
                if pick.is_degraded() {
                    warn!(device = %name, addr = %pick.addr(), "degraded allocation beyond search space");
                }
            }

            let request = LinkCreateRequest::new(
                endpoint_record(&action.a, pick_a.addr()),
                endpoint_record(&action.b, pick_b.addr()),
            );

            debug!(
                connection = %label,
                a = %pick_a.addr(),
                b = %pick_b.addr(),
                round,
                "submitting link"
            );
            match self.create_link(&request, cancel).await {
                Ok(()) => {
                    return self.verify(action, cancel).await;
                }
                Err(CallError::Cancelled) => return failed(FailureReason::Cancelled),
                Err(CallError::Rejected(err)) if is_port_rejection(&err) => {
                    info!(
                        connection = %label,
                        error = %err,
                        round,
                        "port rejected by controller; rescanning"
                    );
                    alloc_a.exclude(pick_a.addr());
                    alloc_b.exclude(pick_b.addr());
                }
                Err(CallError::Exhausted(err) | CallError::Rejected(err)) => {
                    warn!(connection = %label, error = %err, "link submission failed");
                    return failed(FailureReason::ControllerUnreachable);
                }
            }
        }

        failed(FailureReason::NoUsablePort)
    }

    /// Confirm the edge exists by re-fetching links.
    ///
    /// The create response is not trusted: the link only counts once a
    /// fresh read shows the two nodes joined. Port equality is not
    /// required, so a controller that normalizes addresses still
    /// verifies. One re-check runs after a short delay before giving up.
    async fn verify(
        &self,
        action: &CreateLinkAction,
        cancel: &CancellationToken,
    ) -> ConnectionOutcome {
        for pass in 0..2 {
            if pass > 0
                && guard(cancel, tokio::time::sleep(self.policy.verify_recheck_delay))
                    .await
                    .is_none()
            {
                return failed(FailureReason::Cancelled);
            }

            let links = match self.fetch_links(cancel).await {
                Ok(links) => links,
                Err(CallError::Cancelled) => return failed(FailureReason::Cancelled),
                Err(CallError::Exhausted(_) | CallError::Rejected(_)) => {
                    return failed(FailureReason::ControllerUnreachable);
                }
            };

            if let Some(found) = links.iter().find(|l| l.connects(&action.a, &action.b)) {
                let a_port = found.endpoint_on(&action.a).map(|e| e.addr);
                let b_port = found.endpoint_on(&action.b).map(|e| e.addr);
                if let (Some(a_port), Some(b_port)) = (a_port, b_port) {
                    info!(
                        connection = %action.connection.label(),
                        link = %found.id,
                        a = %a_port,
                        b = %b_port,
                        "link verified"
                    );
                    return ConnectionOutcome::Repaired {
                        link: found.id.clone(),
                        a_port,
                        b_port,
                    };
                }
            }
            debug!(connection = %action.connection.label(), pass, "link not visible yet");
        }

        failed(FailureReason::VerificationTimeout)
    }

    async fn fetch_links(&self, cancel: &CancellationToken) -> Result<Vec<Link>, CallError> {
        let records = self
            .with_retry(cancel, "list links", || self.client.list_links())
            .await?;
        Ok(records.into_iter().filter_map(link_from_record).collect())
    }

    async fn create_link(
        &self,
        request: &LinkCreateRequest,
        cancel: &CancellationToken,
    ) -> Result<(), CallError> {
        self.with_retry(cancel, "create link", || self.client.create_link(request))
            .await
            .map(drop)
    }

    /// Run one controller call with transient-failure retries.
    ///
    /// Non-transient refusals surface immediately; timeouts and refused
    /// connections retry up to the budget with doubling delays. The
    /// token is honored both during the call and during backoff sleeps.
    async fn with_retry<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        what: &str,
        mut op: F,
    ) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            match guard(cancel, op()).await {
                None => return Err(CallError::Cancelled),
                Some(Ok(value)) => return Ok(value),
                Some(Err(err)) if err.is_transient() => {
                    if attempt >= self.policy.max_transport_retries {
                        warn!(what, attempts = attempt, error = %err, "transport retries exhausted");
                        return Err(CallError::Exhausted(err));
                    }
                    let delay = self.policy.backoff_delay(attempt);
                    debug!(what, attempt, ?delay, error = %err, "transient failure; backing off");
                    if guard(cancel, tokio::time::sleep(delay)).await.is_none() {
                        return Err(CallError::Cancelled);
                    }
                    attempt += 1;
                }
                Some(Err(err)) => return Err(CallError::Rejected(err)),
            }
        }
    }
}

fn failed(reason: FailureReason) -> ConnectionOutcome {
    ConnectionOutcome::Failed { reason }
}

fn endpoint_record(node: &NodeId, addr: PortAddress) -> LinkEndpointRecord {
    LinkEndpointRecord {
        node_id: node.as_str().to_owned(),
        adapter_number: addr.adapter,
        port_number: addr.port,
    }
}
