//! `plan` — compute the repair plan without touching the lab.

use std::fmt::Write as _;
use std::path::PathBuf;

use tabled::{Table, Tabled, settings::Style};

use labmend_api::ControllerClient;
use labmend_core::RepairPlan;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Action")]
    action: String,
}

fn plan_rows(plan: &RepairPlan) -> Vec<PlanRow> {
    let mut rows = Vec::new();
    for action in &plan.actions {
        rows.push(PlanRow {
            connection: action.connection.label(),
            priority: action.connection.priority.to_string(),
            action: "create link".into(),
        });
    }
    for conn in &plan.pre_satisfied {
        rows.push(PlanRow {
            connection: conn.label(),
            priority: conn.priority.to_string(),
            action: "none (already wired)".into(),
        });
    }
    for (conn, reason) in &plan.unresolvable {
        rows.push(PlanRow {
            connection: conn.label(),
            priority: conn.priority.to_string(),
            action: format!("cannot repair: {reason}"),
        });
    }
    rows
}

fn render_plan(plan: &RepairPlan) -> String {
    let rows = plan_rows(plan);
    let mut out = if rows.is_empty() {
        "catalog is empty; nothing to plan".to_owned()
    } else {
        Table::new(rows).with(Style::rounded()).to_string()
    };

    let _ = write!(out, "\n{}", plan.summary());
    if !plan.isolated.is_empty() {
        let names: Vec<&str> = plan.isolated.iter().map(|n| n.name.as_str()).collect();
        let _ = write!(
            out,
            "\nisolated (reported, never auto-wired): {}",
            names.join(", ")
        );
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &ControllerClient,
    catalog_path: Option<PathBuf>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = util::require_catalog(catalog_path)?;
    let catalog = labmend_config::load_catalog(&path)?;

    let model = labmend_core::observe(client).await?;
    let plan = labmend_core::planner::plan(&model, &catalog);

    let out = output::render_single(&global.output, &plan, render_plan, |p| {
        p.actions
            .iter()
            .map(|a| a.connection.label())
            .collect::<Vec<_>>()
            .join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
