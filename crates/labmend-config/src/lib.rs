//! Shared configuration for the labmend CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! desired-state catalog files, and translation into the transport
//! settings `labmend_api::ControllerClient` is built from. The CLI adds
//! flag-aware overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use labmend_api::{BasicCredentials, TlsMode, TransportConfig};
use labmend_core::CatalogError;

pub mod catalog_file;

pub use catalog_file::load_catalog;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("password required for user '{username}' in profile '{profile}'")]
    NoCredentials { username: String, profile: String },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is absent.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Deadline for read calls (topology fetches), humantime syntax.
    #[serde(default = "default_read_timeout")]
    pub read_timeout: String,

    /// Deadline for mutating calls (link creation), humantime syntax.
    #[serde(default = "default_mutate_timeout")]
    pub mutate_timeout: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            read_timeout: default_read_timeout(),
            mutate_timeout: default_mutate_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_read_timeout() -> String {
    "5s".into()
}
fn default_mutate_timeout() -> String {
    "15s".into()
}

/// A named controller profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "http://10.0.0.5:3080").
    pub controller: String,

    /// Project UUID on that controller.
    pub project: String,

    /// Path to the desired-state catalog for this lab.
    pub catalog: Option<PathBuf>,

    /// Username for controllers with authentication enabled.
    pub username: Option<String>,

    /// Password (plaintext — prefer keyring or `LABMEND_PASSWORD`).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification for this profile.
    pub insecure: Option<bool>,

    /// Override the read deadline, humantime syntax.
    pub read_timeout: Option<String>,

    /// Override the mutate deadline, humantime syntax.
    pub mutate_timeout: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "labmend", "labmend").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("labmend");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("LABMEND_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve credentials for a profile, if the controller needs any.
///
/// Most lab controllers run unauthenticated; a profile without a
/// username (and no `LABMEND_USERNAME`) resolves to `None`. When a
/// username is set, the password comes from `LABMEND_PASSWORD`, then
/// the system keyring, then the profile's plaintext field.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<BasicCredentials>, ConfigError> {
    let Some(username) = profile
        .username
        .clone()
        .or_else(|| std::env::var("LABMEND_USERNAME").ok())
    else {
        return Ok(None);
    };

    // 1. Environment
    if let Ok(pw) = std::env::var("LABMEND_PASSWORD") {
        return Ok(Some(BasicCredentials {
            username,
            password: SecretString::from(pw),
        }));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("labmend", &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(Some(BasicCredentials {
                username,
                password: SecretString::from(pw),
            }));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(Some(BasicCredentials {
            username,
            password: SecretString::from(pw.clone()),
        }));
    }

    Err(ConfigError::NoCredentials {
        username,
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring for a profile.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new("labmend", &format!("{profile_name}/password")).map_err(
        |e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        },
    )?;
    entry
        .set_password(password)
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Controller settings assembly ────────────────────────────────────

/// Everything needed to construct a `ControllerClient`.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub controller: Url,
    pub project: String,
    pub transport: TransportConfig,
}

fn parse_timeout(raw: &str, field: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{raw}': {e}"),
    })
}

/// Build `ControllerSettings` from a profile.
///
/// Validates the controller URL and the project UUID up front so a
/// typo fails here with a named field instead of as a confusing 404
/// halfway into a run.
pub fn profile_to_settings(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerSettings, ConfigError> {
    let controller: Url = profile
        .controller
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "controller".into(),
            reason: format!("invalid URL: {}", profile.controller),
        })?;

    uuid::Uuid::parse_str(&profile.project).map_err(|_| ConfigError::Validation {
        field: "project".into(),
        reason: format!("not a project UUID: {}", profile.project),
    })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let read_raw = profile
        .read_timeout
        .as_deref()
        .unwrap_or(&defaults.read_timeout);
    let mutate_raw = profile
        .mutate_timeout
        .as_deref()
        .unwrap_or(&defaults.mutate_timeout);

    let transport = TransportConfig {
        tls,
        read_timeout: parse_timeout(read_raw, "read_timeout")?,
        mutate_timeout: parse_timeout(mutate_raw, "mutate_timeout")?,
        auth: resolve_credentials(profile, profile_name)?,
    };

    Ok(ControllerSettings {
        controller,
        project: profile.project.clone(),
        transport,
    })
}
