use thiserror::Error;

/// Top-level error type for the `labmend-api` crate.
///
/// Covers every failure mode of a controller conversation: transport,
/// authentication, port conflicts, and malformed payloads. `labmend-core`
/// maps these into fatal errors or per-action typed outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded its per-call deadline.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller responses ────────────────────────────────────────
    /// Credentials rejected (HTTP 401/403 from a controller with auth enabled).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The controller refused the request because a port is already in use
    /// (HTTP 409, or a 4xx whose body names an occupied port).
    #[error("Port conflict: {message}")]
    Conflict { message: String },

    /// Any other non-success response from the controller.
    #[error("Controller error (HTTP {status}): {message}")]
    Controller { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient transport failure worth retrying
    /// with backoff (timeouts, refused connections).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the controller reported a port collision, i.e. the
    /// chosen `(adapter, port)` was taken between allocation and submit.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if this is a "not found" response.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Controller { status: 404, .. } => true,
            _ => false,
        }
    }
}
