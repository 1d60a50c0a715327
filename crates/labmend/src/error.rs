//! CLI error types with miette diagnostics.
//!
//! Maps `labmend_api::Error`, `CoreError`, and `ConfigError` into
//! user-facing errors with actionable help text and exit codes.

use miette::Diagnostic;
use thiserror::Error;

use labmend_config::ConfigError;
use labmend_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    /// `apply` finished, but at least one desired connection stayed broken.
    pub const UNRESOLVED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(labmend::connection_failed),
        help(
            "Check that the controller is running and accessible.\n\
             URL: {url}\n\
             Try: labmend ping"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS error: {message}")]
    #[diagnostic(
        code(labmend::tls_error),
        help(
            "If the controller uses a self-signed certificate, pass --insecure (-k)\n\
             or configure ca_cert in your profile."
        )
    )]
    TlsError { message: String },

    #[error("Could not read the lab baseline (nodes and links)")]
    #[diagnostic(
        code(labmend::baseline),
        help(
            "Nothing was changed. Check the controller URL and the project id.\n\
             Try: labmend ping"
        )
    )]
    Baseline {
        #[source]
        source: labmend_api::Error,
    },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed")]
    #[diagnostic(
        code(labmend::auth_failed),
        help(
            "Verify the username and password for this controller.\n\
             Run: labmend config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(labmend::no_credentials),
        help(
            "Configure credentials with: labmend config init\n\
             Or set the LABMEND_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(labmend::not_found),
        help("Run: labmend {list_command} to see what the lab contains")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Controller responses ─────────────────────────────────────────

    #[error("Controller error (HTTP {status}): {message}")]
    #[diagnostic(code(labmend::controller))]
    Controller { status: u16, message: String },

    #[error("Controller sent a response this client could not parse: {message}")]
    #[diagnostic(
        code(labmend::bad_response),
        help("The controller may be a version this tool does not understand.")
    )]
    BadResponse { message: String },

    // ── Reconciliation ───────────────────────────────────────────────

    #[error("Reconciliation left {failed} connection(s) unrepaired")]
    #[diagnostic(
        code(labmend::unresolved),
        help(
            "The report above names each failure. Fix device names in the catalog,\n\
             free up ports, or check controller health, then re-run: labmend apply"
        )
    )]
    Unresolved { failed: usize },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(labmend::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(labmend::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: labmend config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(labmend::no_config),
        help(
            "Create one with: labmend config init\n\
             Or pass --controller and --project directly.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(labmend::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(labmend::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(labmend::timeout),
        help("Increase the deadline with --timeout or check controller responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Unresolved { .. } => exit_code::UNRESOLVED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Baseline { source } => baseline_exit_code(source),
            Self::Config(inner) => match **inner {
                ConfigError::NoCredentials { .. } => exit_code::AUTH,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }
}

/// A baseline read can fail for very different reasons; keep the exit
/// code faithful to the underlying one.
fn baseline_exit_code(source: &labmend_api::Error) -> i32 {
    if source.is_transient() {
        return exit_code::CONNECTION;
    }
    if source.is_not_found() {
        return exit_code::NOT_FOUND;
    }
    match source {
        labmend_api::Error::Authentication { .. } => exit_code::AUTH,
        labmend_api::Error::Transport(_) | labmend_api::Error::Tls(_) => exit_code::CONNECTION,
        _ => exit_code::GENERAL,
    }
}

// ── Error source mappings ────────────────────────────────────────────

impl From<labmend_api::Error> for CliError {
    fn from(err: labmend_api::Error) -> Self {
        match err {
            labmend_api::Error::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            labmend_api::Error::Tls(message) => Self::TlsError { message },

            labmend_api::Error::InvalidUrl(e) => Self::Validation {
                field: "controller".into(),
                reason: e.to_string(),
            },

            labmend_api::Error::Authentication { .. }
            | labmend_api::Error::Controller {
                status: 401 | 403, ..
            } => Self::AuthFailed {
                profile: "current".into(),
            },

            labmend_api::Error::Conflict { message } => Self::Controller {
                status: 409,
                message,
            },

            labmend_api::Error::Controller { status, message } => {
                Self::Controller { status, message }
            }

            labmend_api::Error::Deserialization { message, .. } => Self::BadResponse { message },

            labmend_api::Error::Transport(e) => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "controller".into(), ToString::to_string),
                source: Box::new(e),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BaselineUnavailable { source } => Self::Baseline { source },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile, .. } => Self::NoCredentials { profile },
            other => Self::Config(Box::new(other)),
        }
    }
}
