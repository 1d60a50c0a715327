// Integration tests for `ControllerClient` using wiremock.

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use labmend_api::types::{LinkCreateRequest, LinkEndpointRecord};
use labmend_api::{ControllerClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

const PROJECT: &str = "6b2b36a0-8a0a-4c55-96a8-856c7321a91b";

async fn setup() -> (MockServer, ControllerClient) {
    let server = MockServer::start().await;
    let client = ControllerClient::from_reqwest(&server.uri(), PROJECT, reqwest::Client::new())
        .expect("client builds from mock URI");
    (server, client)
}

fn endpoint(node_id: &str, adapter: u32, port: u32) -> LinkEndpointRecord {
    LinkEndpointRecord {
        node_id: node_id.to_owned(),
        adapter_number: adapter,
        port_number: port,
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_nodes() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "node_id": "00339e94-1e52-4c65-9c15-0f7e56b2c3a1",
            "name": "SW-LAN",
            "node_type": "ethernet_switch",
            "status": "started",
            "console": 5000,
            "symbol": ":/symbols/ethernet_switch.svg"
        },
        {
            "node_id": "e581f562-efa5-47d8-8b93-8b33d6a43a27",
            "name": "PC1",
            "node_type": "vpcs",
            "status": "started"
        }
    ]);

    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{PROJECT}/nodes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let nodes = client.list_nodes().await.expect("nodes list");

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].name, "SW-LAN");
    assert_eq!(nodes[0].node_type, "ethernet_switch");
    assert_eq!(nodes[1].status, "started");
}

#[tokio::test]
async fn test_list_links() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "link_id": "a61b43bd-9e1c-4a5a-9d8f-2b7d53135f9a",
            "link_type": "ethernet",
            "nodes": [
                { "node_id": "n-1", "adapter_number": 0, "port_number": 0 },
                { "node_id": "n-2", "adapter_number": 0, "port_number": 3 }
            ]
        }
    ]);

    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{PROJECT}/links")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let links = client.list_links().await.expect("links list");

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].nodes.len(), 2);
    assert_eq!(links[0].nodes[1].port_number, 3);
}

#[tokio::test]
async fn test_create_link() {
    let (server, client) = setup().await;

    let link_id = Uuid::new_v4().to_string();
    let req = LinkCreateRequest::new(endpoint("n-1", 0, 1), endpoint("n-2", 0, 0));

    Mock::given(method("POST"))
        .and(path(format!("/v2/projects/{PROJECT}/links")))
        .and(body_json(json!({
            "nodes": [
                { "node_id": "n-1", "adapter_number": 0, "port_number": 1 },
                { "node_id": "n-2", "adapter_number": 0, "port_number": 0 }
            ]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "link_id": link_id,
            "nodes": [
                { "node_id": "n-1", "adapter_number": 0, "port_number": 1 },
                { "node_id": "n-2", "adapter_number": 0, "port_number": 0 }
            ]
        })))
        .mount(&server)
        .await;

    let created = client.create_link(&req).await.expect("link created");

    assert_eq!(created.link_id, link_id);
    assert_eq!(created.nodes[0].node_id, "n-1");
}

#[tokio::test]
async fn test_delete_link() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/v2/projects/{PROJECT}/links/l-99")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.delete_link("l-99").await.expect("link deleted");
}

#[tokio::test]
async fn test_start_node() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("/v2/projects/{PROJECT}/nodes/n-1/start")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "node_id": "n-1",
            "status": "started"
        })))
        .mount(&server)
        .await;

    client.start_node("n-1").await.expect("node started");
}

#[tokio::test]
async fn test_version_probe() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/version"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "version": "2.2.44", "local": true })),
        )
        .mount(&server)
        .await;

    let info = client.version().await.expect("version info");
    assert_eq!(info.version, "2.2.44");
    assert!(info.local);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_conflict_on_409() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(format!("/v2/projects/{PROJECT}/links")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "Port is already used",
            "status": 409
        })))
        .mount(&server)
        .await;

    let req = LinkCreateRequest::new(endpoint("n-1", 0, 0), endpoint("n-2", 0, 0));
    let err = client.create_link(&req).await.expect_err("must conflict");

    assert!(err.is_conflict(), "expected conflict, got: {err:?}");
    match err {
        Error::Conflict { message } => assert_eq!(message, "Port is already used"),
        other => panic!("expected Conflict, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_conflict_from_error_body_wording() {
    let (server, client) = setup().await;

    // Some controller builds answer 400 for a taken port; the body wording
    // is still authoritative.
    Mock::given(method("POST"))
        .and(path(format!("/v2/projects/{PROJECT}/links")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Port 0/2 is already used by another link"
        })))
        .mount(&server)
        .await;

    let req = LinkCreateRequest::new(endpoint("n-1", 0, 2), endpoint("n-2", 0, 0));
    let err = client.create_link(&req).await.expect_err("must conflict");

    assert!(err.is_conflict(), "expected conflict, got: {err:?}");
}

#[tokio::test]
async fn test_error_404_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{PROJECT}/nodes")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Project not found" })),
        )
        .mount(&server)
        .await;

    let err = client.list_nodes().await.expect_err("must fail");

    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    match err {
        Error::Controller { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Project not found");
        }
        other => panic!("expected Controller error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_401_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_links().await.expect_err("must fail");
    assert!(
        matches!(err, Error::Authentication { .. }),
        "expected Authentication, got: {err:?}"
    );
}

#[tokio::test]
async fn test_error_500_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.list_nodes().await.expect_err("must fail");

    match err {
        Error::Controller { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Controller 500 error, got: {other:?}"),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client.version().await.expect_err("must fail");
    assert!(
        matches!(err, Error::Deserialization { .. }),
        "expected Deserialization, got: {err:?}"
    );
}

#[tokio::test]
async fn test_multibyte_body_truncates_without_panicking() {
    let (server, client) = setup().await;

    // Long enough that the 200-byte preview cut falls inside the 'é';
    // the error must carry a truncated preview, not panic mid-slice.
    let body = format!("{}é and more trailing text to pass the preview cut", "x".repeat(199));

    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{PROJECT}/nodes")))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .mount(&server)
        .await;

    let err = client.list_nodes().await.expect_err("must fail");
    assert!(
        matches!(err, Error::Deserialization { .. }),
        "expected Deserialization, got: {err:?}"
    );
}

#[tokio::test]
async fn test_multibyte_error_body_truncates_without_panicking() {
    let (server, client) = setup().await;

    let body = format!("{}é and more trailing text to pass the preview cut", "x".repeat(199));

    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{PROJECT}/nodes")))
        .respond_with(ResponseTemplate::new(502).set_body_string(&body))
        .mount(&server)
        .await;

    let err = client.list_nodes().await.expect_err("must fail");
    match err {
        Error::Controller { status, message } => {
            assert_eq!(status, 502);
            // The cut backs off past the 'é' to the last full character.
            assert_eq!(message, "x".repeat(199));
        }
        other => panic!("expected Controller error, got: {other:?}"),
    }
}
