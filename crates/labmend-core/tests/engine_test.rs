#![allow(clippy::unwrap_used)]
// End-to-end reconciliation runs against a mocked controller.

use std::time::Duration;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use labmend_api::ControllerClient;
use labmend_core::{
    ApplierPolicy, ConnectionOutcome, CoreError, DesiredConnection, DesiredStateCatalog,
    FailureReason, PortAddress, Priority, engine,
};

// ── Fixtures ────────────────────────────────────────────────────────

const PROJECT: &str = "6b2b36a0-8a0a-4c55-96a8-856c7321a91b";
const SW_LAN: &str = "00339e94-1e52-4c65-9c15-0f7e56b2c3a1";
const PC1: &str = "e581f562-efa5-47d8-8b93-8b33d6a43a27";
const PC2: &str = "7d5ae3a2-4f21-4c8d-9b7a-63f0c3b2a111";
const FW: &str = "c0a1f9d4-2e4b-45cc-9f01-54cf2b9d4222";

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let client = ControllerClient::from_reqwest(&server.uri(), PROJECT, reqwest::Client::new())
        .expect("client builds from mock URI");
    (server, client)
}

/// Millisecond-scale delays so retry and verification paths run fast.
fn fast_policy() -> ApplierPolicy {
    ApplierPolicy {
        backoff_base: Duration::from_millis(1),
        verify_recheck_delay: Duration::from_millis(1),
        ..ApplierPolicy::default()
    }
}

fn nodes_path() -> String {
    format!("/v2/projects/{PROJECT}/nodes")
}

fn links_path() -> String {
    format!("/v2/projects/{PROJECT}/links")
}

fn node(id: &str, name: &str, node_type: &str, status: &str) -> Value {
    json!({ "node_id": id, "name": name, "node_type": node_type, "status": status })
}

fn link(id: &str, a: (&str, u32, u32), b: (&str, u32, u32)) -> Value {
    json!({
        "link_id": id,
        "nodes": [
            { "node_id": a.0, "adapter_number": a.1, "port_number": a.2 },
            { "node_id": b.0, "adapter_number": b.1, "port_number": b.2 }
        ]
    })
}

fn endpoint_body(node_id: &str, adapter: u32, port: u32) -> Value {
    json!({ "node_id": node_id, "adapter_number": adapter, "port_number": port })
}

fn catalog(entries: &[(&str, &str, Priority)]) -> DesiredStateCatalog {
    DesiredStateCatalog::new(
        entries
            .iter()
            .map(|(a, b, priority)| DesiredConnection {
                a: (*a).to_owned(),
                b: (*b).to_owned(),
                priority: *priority,
                rationale: String::new(),
            })
            .collect(),
    )
    .expect("valid catalog")
}

/// The standard four-node lab: SW-LAN wired to PC2 and FW, PC1 loose.
fn standard_nodes() -> Value {
    json!([
        node(SW_LAN, "SW-LAN", "ethernet_switch", "started"),
        node(PC1, "PC1", "vpcs", "started"),
        node(PC2, "PC2", "vpcs", "started"),
        node(FW, "FW", "docker", "started"),
    ])
}

fn standard_links() -> Vec<Value> {
    vec![
        link("l1", (SW_LAN, 0, 0), (PC2, 0, 0)),
        link("l2", (SW_LAN, 0, 2), (FW, 0, 0)),
    ]
}

// ── Repair scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn repair_wires_the_lowest_free_ports() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(standard_nodes()))
        .mount(&server)
        .await;

    // Baseline for the observe pass and the pre-allocation re-fetch,
    // then the updated list once the link exists.
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(standard_links())))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    let mut updated = standard_links();
    updated.push(link("l3", (SW_LAN, 0, 1), (PC1, 0, 0)));
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(updated)))
        .mount(&server)
        .await;

    // SW-LAN occupies 0/0 and 0/2, so the scan must pick 0/1; PC1 is
    // untouched and gets 0/0.
    Mock::given(method("POST"))
        .and(path(links_path()))
        .and(body_json(json!({
            "nodes": [endpoint_body(SW_LAN, 0, 1), endpoint_body(PC1, 0, 0)]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(link(
            "l3",
            (SW_LAN, 0, 1),
            (PC1, 0, 0),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine::reconcile(
        &client,
        &catalog(&[("SW-LAN", "PC1", Priority::High)]),
        fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .expect("reconcile succeeds");

    assert_eq!(report.repaired_count(), 1);
    assert!(!report.has_failures());
    assert_eq!(
        report.connections[0].outcome,
        ConnectionOutcome::Repaired {
            link: "l3".into(),
            a_port: PortAddress::new(0, 1),
            b_port: PortAddress::new(0, 0),
        }
    );
    assert!(report.still_isolated.is_empty());
}

#[tokio::test]
async fn second_run_creates_nothing() {
    let (server, client) = setup().await;

    let mut links = standard_links();
    links.push(link("l3", (SW_LAN, 0, 1), (PC1, 0, 0)));

    Mock::given(method("GET"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(standard_nodes()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(links)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let report = engine::reconcile(
        &client,
        &catalog(&[("SW-LAN", "PC1", Priority::High)]),
        fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .expect("reconcile succeeds");

    assert_eq!(report.satisfied_count(), 1);
    assert_eq!(report.repaired_count(), 0);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn unknown_device_fails_without_aborting_the_run() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(standard_nodes()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(standard_links())))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    let mut updated = standard_links();
    updated.push(link("l3", (SW_LAN, 0, 1), (PC1, 0, 0)));
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(updated)))
        .mount(&server)
        .await;

    // Only the resolvable entry reaches the controller.
    Mock::given(method("POST"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(link(
            "l3",
            (SW_LAN, 0, 1),
            (PC1, 0, 0),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine::reconcile(
        &client,
        &catalog(&[
            ("SW-LAN", "GHOST", Priority::Critical),
            ("SW-LAN", "PC1", Priority::Low),
        ]),
        fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .expect("reconcile succeeds");

    // Report order mirrors the catalog, not the priority order.
    assert_eq!(report.connections[0].connection.b, "GHOST");
    assert_eq!(
        report.connections[0].outcome,
        ConnectionOutcome::Failed {
            reason: FailureReason::UnknownDevice
        }
    );
    assert_eq!(report.connections[1].connection.b, "PC1");
    assert_eq!(report.repaired_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(report.has_failures());
}

#[tokio::test]
async fn isolated_nodes_are_reported_never_wired() {
    let (server, client) = setup().await;

    // LONELY is started with zero links; the stopped spare and the
    // cloud bridge must not be flagged, and nothing may be created.
    let nodes = json!([
        node(SW_LAN, "SW-LAN", "ethernet_switch", "started"),
        node(PC2, "PC2", "vpcs", "started"),
        node(PC1, "LONELY", "vpcs", "started"),
        node(FW, "SPARE", "qemu", "stopped"),
        node("c9dd1e5a-0000-4c65-9c15-000000000001", "NET", "cloud", "started"),
    ]);

    Mock::given(method("GET"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([link("l1", (SW_LAN, 0, 0), (PC2, 0, 0))])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let report = engine::reconcile(
        &client,
        &DesiredStateCatalog::default(),
        fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .expect("reconcile succeeds");

    let isolated: Vec<&str> = report
        .still_isolated
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(isolated, vec!["LONELY"]);
    assert!(report.connections.is_empty());
}

#[tokio::test]
async fn port_conflict_retries_with_the_next_candidates() {
    let (server, client) = setup().await;

    let baseline = vec![link("l1", (SW_LAN, 0, 0), (PC2, 0, 0))];

    Mock::given(method("GET"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(standard_nodes()))
        .mount(&server)
        .await;
    // Observe, allocation round one, allocation round two.
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(baseline)))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    let mut updated = baseline.clone();
    updated.push(link("l9", (SW_LAN, 0, 2), (PC1, 0, 1)));
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(updated)))
        .mount(&server)
        .await;

    // First pick (SW-LAN 0/1, PC1 0/0) lost a race; both sides advance.
    Mock::given(method("POST"))
        .and(path(links_path()))
        .and(body_json(json!({
            "nodes": [endpoint_body(SW_LAN, 0, 1), endpoint_body(PC1, 0, 0)]
        })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Port is already used", "status": 409
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(links_path()))
        .and(body_json(json!({
            "nodes": [endpoint_body(SW_LAN, 0, 2), endpoint_body(PC1, 0, 1)]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(link(
            "l9",
            (SW_LAN, 0, 2),
            (PC1, 0, 1),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine::reconcile(
        &client,
        &catalog(&[("SW-LAN", "PC1", Priority::High)]),
        fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .expect("reconcile succeeds");

    assert_eq!(
        report.connections[0].outcome,
        ConnectionOutcome::Repaired {
            link: "l9".into(),
            a_port: PortAddress::new(0, 2),
            b_port: PortAddress::new(0, 1),
        }
    );
}

#[tokio::test]
async fn missing_link_after_create_is_a_verification_timeout() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(standard_nodes()))
        .mount(&server)
        .await;
    // The created link never shows up in any re-fetch.
    Mock::given(method("GET"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(standard_links())))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(links_path()))
        .respond_with(ResponseTemplate::new(201).set_body_json(link(
            "l3",
            (SW_LAN, 0, 1),
            (PC1, 0, 0),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine::reconcile(
        &client,
        &catalog(&[("SW-LAN", "PC1", Priority::High)]),
        fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .expect("reconcile succeeds");

    assert_eq!(
        report.connections[0].outcome,
        ConnectionOutcome::Failed {
            reason: FailureReason::VerificationTimeout
        }
    );
    assert!(report.has_failures());
}

// ── Fatal baseline ──────────────────────────────────────────────────

#[tokio::test]
async fn unreadable_baseline_aborts_the_run() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(nodes_path()))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let err = engine::reconcile(
        &client,
        &catalog(&[("SW-LAN", "PC1", Priority::High)]),
        fast_policy(),
        &CancellationToken::new(),
    )
    .await
    .expect_err("baseline failure is fatal");

    assert!(matches!(err, CoreError::BaselineUnavailable { .. }));
    assert!(err.to_string().contains("cannot read lab baseline"));
}
