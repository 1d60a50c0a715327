// Shared transport configuration for building reqwest::Client instances.
//
// The controller exposes two weight classes of call: cheap topology reads
// and heavier mutating operations. Each carries its own deadline so a
// wedged create-link call cannot stall the run for the full read budget.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// TLS verification mode for the controller connection.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed lab controllers).
    DangerAcceptInvalid,
}

/// HTTP Basic credentials for controllers with auth enabled.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Deadline for read calls (list nodes/links, version probe).
    pub read_timeout: Duration,
    /// Deadline for mutating calls (create/delete link, start/stop node).
    pub mutate_timeout: Duration,
    pub auth: Option<BasicCredentials>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            // Lab controllers answer reads quickly; link creation can take
            // longer while the emulator wires the endpoints up.
            tls: TlsMode::System,
            read_timeout: Duration::from_secs(5),
            mutate_timeout: Duration::from_secs(15),
            auth: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Per-call deadlines are applied on each request; the client itself
    /// only carries the connect timeout and TLS settings.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("labmend/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path).map_err(|e| {
                    crate::error::Error::Tls(format!("failed to read CA cert: {e}"))
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| crate::error::Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Set HTTP Basic credentials.
    pub fn with_auth(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.auth = Some(BasicCredentials {
            username: username.into(),
            password,
        });
        self
    }
}
