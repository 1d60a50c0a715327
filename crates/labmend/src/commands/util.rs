//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::PathBuf;

use labmend_api::ControllerClient;
use labmend_core::{NameLookup, NodeId};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Refuses instead of hanging when stdin is not a terminal.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Unwrap the catalog path or explain how to provide one.
pub fn require_catalog(path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    path.ok_or_else(|| CliError::Validation {
        field: "catalog".into(),
        reason: "no catalog file configured; pass --catalog or set `catalog` in the profile"
            .into(),
    })
}

/// Resolve a device name to its controller id via a fresh snapshot.
pub async fn resolve_node(client: &ControllerClient, name: &str) -> Result<NodeId, CliError> {
    let model = labmend_core::observe(client).await?;
    match model.resolve(name) {
        NameLookup::Found(node) => Ok(node.id.clone()),
        NameLookup::Unknown => Err(CliError::NotFound {
            resource_type: "node".into(),
            identifier: name.into(),
            list_command: "topology".into(),
        }),
        NameLookup::Ambiguous { count } => Err(CliError::Validation {
            field: "node".into(),
            reason: format!("name '{name}' matches {count} nodes; rename devices to disambiguate"),
        }),
    }
}
