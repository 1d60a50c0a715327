//! `catalog check` — validate the desired-state file, offline or live.

use serde::Serialize;
use tabled::Tabled;

use labmend_api::ControllerClient;
use labmend_core::{DesiredConnection, NameLookup, NodeId, TopologyModel};

use crate::cli::{CatalogArgs, CatalogCommand, GlobalOpts};
use crate::config::resolve_catalog_path;
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Tabled)]
struct CatalogRow {
    #[tabled(rename = "A")]
    a: String,
    #[tabled(rename = "B")]
    b: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Rationale")]
    rationale: String,
}

#[derive(Clone, Serialize, Tabled)]
struct CheckRow {
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn resolve_one(model: &TopologyModel, name: &str) -> Result<NodeId, String> {
    match model.resolve(name) {
        NameLookup::Found(node) => Ok(node.id.clone()),
        NameLookup::Unknown => Err(format!("unknown device: {name}")),
        NameLookup::Ambiguous { count } => Err(format!("ambiguous name: {name} ({count} nodes)")),
    }
}

fn resolution_status(model: &TopologyModel, conn: &DesiredConnection) -> String {
    let a = match resolve_one(model, &conn.a) {
        Ok(id) => id,
        Err(status) => return status,
    };
    let b = match resolve_one(model, &conn.b) {
        Ok(id) => id,
        Err(status) => return status,
    };
    if model.has_edge(&a, &b) {
        "already wired".to_owned()
    } else {
        "missing (apply would create)".to_owned()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: CatalogArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let CatalogCommand::Check { resolve } = args.command;

    let path = resolve_catalog_path(global)?;
    let catalog = labmend_config::load_catalog(&path)?;

    if resolve {
        let (settings, _) = crate::config::resolve_settings(global)?;
        let client = ControllerClient::new(
            settings.controller.as_str(),
            settings.project,
            &settings.transport,
        )?;
        let model = labmend_core::observe(&client).await?;

        let views: Vec<CheckRow> = catalog
            .connections()
            .iter()
            .map(|conn| CheckRow {
                connection: conn.label(),
                priority: conn.priority.to_string(),
                status: resolution_status(&model, conn),
            })
            .collect();
        let out = output::render_list(&global.output, &views, Clone::clone, |v| {
            format!("{}\t{}", v.connection, v.status)
        });
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    // Offline: validation already happened in the loader; show the entries.
    let views: Vec<CatalogRow> = catalog
        .connections()
        .iter()
        .map(|conn| CatalogRow {
            a: conn.a.clone(),
            b: conn.b.clone(),
            priority: conn.priority.to_string(),
            rationale: conn.rationale.clone(),
        })
        .collect();
    let out = output::render_list(&global.output, &views, Clone::clone, |v| {
        format!("{} <-> {}", v.a, v.b)
    });
    output::print_output(&out, global.quiet);
    if !global.quiet {
        eprintln!(
            "✓ catalog OK: {} connections ({})",
            catalog.len(),
            path.display()
        );
    }
    Ok(())
}
