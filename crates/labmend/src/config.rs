//! CLI configuration — thin wrapper around `labmend_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--controller, --project, ...).

use std::path::PathBuf;
use std::time::Duration;

use labmend_config::{ControllerSettings, profile_to_settings};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use labmend_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Translate the config file + global flags into `ControllerSettings`
/// and the catalog path for this invocation.
///
/// CLI flag overrides take priority over profile values. When no profile
/// exists, --controller and --project alone are enough to proceed.
pub fn resolve_settings(
    global: &GlobalOpts,
) -> Result<(ControllerSettings, Option<PathBuf>), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.controller.is_some() => Profile::default(),
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // Flag > env > profile; clap already folded the env vars in.
    if let Some(ref controller) = global.controller {
        profile.controller.clone_from(controller);
    }
    if let Some(ref project) = global.project {
        profile.project.clone_from(project);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }

    if profile.project.is_empty() {
        return Err(CliError::Validation {
            field: "project".into(),
            reason: "no project id; pass --project or set one in the profile".into(),
        });
    }

    let mut settings = profile_to_settings(&profile, &profile_name, &cfg.defaults)?;

    // A single --timeout covers both deadlines.
    if let Some(seconds) = global.timeout {
        settings.transport.read_timeout = Duration::from_secs(seconds);
        settings.transport.mutate_timeout = Duration::from_secs(seconds);
    }

    let catalog = global.catalog.clone().or_else(|| profile.catalog.clone());
    Ok((settings, catalog))
}

/// Resolve the catalog path alone, for commands that never need a
/// controller connection (offline catalog validation).
pub fn resolve_catalog_path(global: &GlobalOpts) -> Result<PathBuf, CliError> {
    if let Some(ref path) = global.catalog {
        return Ok(path.clone());
    }
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    cfg.profiles
        .get(&profile_name)
        .and_then(|p| p.catalog.clone())
        .ok_or_else(|| CliError::Validation {
            field: "catalog".into(),
            reason: "no catalog file configured; pass --catalog or set `catalog` in the profile"
                .into(),
        })
}
