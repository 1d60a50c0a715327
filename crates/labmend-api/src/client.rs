// Controller HTTP client.
//
// Wraps `reqwest::Client` with versioned-path construction, project-scoped
// URLs, per-call deadlines, and typed error mapping. The engine in
// `labmend-core` drives topology reads and link mutations through this
// client; it never sees raw HTTP.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{BasicCredentials, TransportConfig};
use crate::types::{LinkCreateRequest, LinkRecord, NodeRecord, VersionInfo};

/// Error body shape the controller attaches to non-success responses.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// At most `max` bytes of a body, cut on a char boundary.
///
/// Bodies land in logs and error messages verbatim; a fixed byte cut
/// could split a multibyte character and panic on the slice.
fn preview(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Async client for a GNS3-class lab controller's REST API.
///
/// All paths live under the versioned prefix (`/v2/`); topology endpoints
/// are additionally scoped to one project. The client is cheap to clone
/// (reqwest pools connections internally).
#[derive(Clone)]
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    auth: Option<BasicCredentials>,
    read_timeout: Duration,
    mutate_timeout: Duration,
}

impl ControllerClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Create a client for one project on the given controller.
    ///
    /// `base_url` is the controller root (e.g. `http://10.0.0.5:3080`);
    /// the versioned API prefix is appended automatically.
    pub fn new(
        base_url: &str,
        project_id: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            project_id: project_id.into(),
            auth: transport.auth.clone(),
            read_timeout: transport.read_timeout,
            mutate_timeout: transport.mutate_timeout,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages transport settings).
    pub fn from_reqwest(
        base_url: &str,
        project_id: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            project_id: project_id.into(),
            auth: None,
            read_timeout: Duration::from_secs(5),
            mutate_timeout: Duration::from_secs(15),
        })
    }

    /// Append the `/v2/` API prefix unless the caller already included it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/v2") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/v2/"));
        }

        Ok(url)
    }

    /// The project this client is scoped to.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The normalized controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join a relative path (e.g. `"version"`) onto the versioned base.
    fn url(&self, path: &str) -> Result<Url, Error> {
        // base_url always ends with `/v2/`, so joining `projects/…` works.
        Ok(self.base_url.join(path)?)
    }

    /// Build a project-scoped relative path.
    fn project_path(&self, path: &str) -> String {
        format!("projects/{}/{path}", self.project_id)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(BasicCredentials { username, password }) => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        deadline: Duration,
    ) -> Result<reqwest::Response, Error> {
        let resp = self
            .apply_auth(builder)
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        timeout_secs: deadline.as_secs(),
                    }
                } else {
                    Error::Transport(e)
                }
            })?;
        Ok(resp)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url), self.read_timeout).await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self
            .send(self.http.post(url).json(body), self.mutate_timeout)
            .await?;
        self.handle_response(resp).await
    }

    /// POST with an empty JSON body, discarding any response payload.
    ///
    /// Node start/stop endpoints answer with the full node object; the
    /// engine only cares that the action was accepted.
    async fn post_action(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self
            .send(
                self.http.post(url).json(&serde_json::json!({})),
                self.mutate_timeout,
            )
            .await?;
        self.handle_empty(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.send(self.http.delete(url), self.mutate_timeout).await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let head = preview(&body, 200);
                Error::Deserialization {
                    message: format!("{e} (body preview: {head:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    /// Map a non-success response to a typed error.
    ///
    /// 409 is the controller's port-collision signal; some firmware
    /// versions report the same condition as a 400 with an "already used"
    /// message, so the body is consulted as well.
    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: format!("controller rejected credentials (HTTP {status})"),
            };
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    preview(&raw, 200).to_owned()
                }
            });

        let looks_like_port_in_use = {
            let lower = message.to_ascii_lowercase();
            lower.contains("already used") || lower.contains("already connected")
        };

        if status == reqwest::StatusCode::CONFLICT
            || (status.is_client_error() && looks_like_port_in_use)
        {
            Error::Conflict { message }
        } else {
            Error::Controller {
                status: status.as_u16(),
                message,
            }
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Probe ────────────────────────────────────────────────────────

    /// `GET version` — connectivity and version probe.
    pub async fn version(&self) -> Result<VersionInfo, Error> {
        self.get("version").await
    }

    // ── Topology reads ───────────────────────────────────────────────

    /// `GET projects/{id}/nodes` — all nodes in the project.
    pub async fn list_nodes(&self) -> Result<Vec<NodeRecord>, Error> {
        self.get(&self.project_path("nodes")).await
    }

    /// `GET projects/{id}/links` — all links in the project.
    pub async fn list_links(&self) -> Result<Vec<LinkRecord>, Error> {
        self.get(&self.project_path("links")).await
    }

    // ── Link mutations ───────────────────────────────────────────────

    /// `POST projects/{id}/links` — create a link between two endpoints.
    ///
    /// Returns the created link as the controller recorded it (the
    /// controller may normalize port labels; endpoint identity is what
    /// callers should verify against).
    pub async fn create_link(&self, req: &LinkCreateRequest) -> Result<LinkRecord, Error> {
        self.post(&self.project_path("links"), req).await
    }

    /// `DELETE projects/{id}/links/{link_id}`.
    ///
    /// Exposed for operator tooling; reconciliation itself never deletes
    /// links.
    pub async fn delete_link(&self, link_id: &str) -> Result<(), Error> {
        self.delete(&self.project_path(&format!("links/{link_id}")))
            .await
    }

    // ── Node lifecycle ───────────────────────────────────────────────
    //
    // Used by the "bring lab online" step before reconciliation runs;
    // the engine itself never makes start/stop decisions.

    /// `POST projects/{id}/nodes/{node_id}/start`.
    pub async fn start_node(&self, node_id: &str) -> Result<(), Error> {
        self.post_action(&self.project_path(&format!("nodes/{node_id}/start")))
            .await
    }

    /// `POST projects/{id}/nodes/{node_id}/stop`.
    pub async fn stop_node(&self, node_id: &str) -> Result<(), Error> {
        self.post_action(&self.project_path(&format!("nodes/{node_id}/stop")))
            .await
    }

    /// `POST projects/{id}/nodes/start` — start every node in the project.
    pub async fn start_all_nodes(&self) -> Result<(), Error> {
        self.post_action(&self.project_path("nodes/start")).await
    }

    /// `POST projects/{id}/nodes/stop` — stop every node in the project.
    pub async fn stop_all_nodes(&self) -> Result<(), Error> {
        self.post_action(&self.project_path("nodes/stop")).await
    }
}
