//! `apply` — run a full reconciliation and report per-connection outcomes.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use indicatif::ProgressBar;
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};
use tokio_util::sync::CancellationToken;

use labmend_api::ControllerClient;
use labmend_core::{ApplierPolicy, ConnectionOutcome, ReconciliationReport};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn report_rows(report: &ReconciliationReport) -> Vec<ReportRow> {
    report
        .connections
        .iter()
        .map(|r| {
            let (outcome, detail) = match &r.outcome {
                ConnectionOutcome::AlreadySatisfied => ("ok".to_owned(), "already wired".to_owned()),
                ConnectionOutcome::Repaired { link, a_port, b_port } => (
                    "repaired".to_owned(),
                    format!("{a_port} <-> {b_port} (link {link})"),
                ),
                ConnectionOutcome::Failed { reason } => ("FAILED".to_owned(), reason.to_string()),
            };
            ReportRow {
                connection: r.connection.label(),
                priority: r.connection.priority.to_string(),
                outcome,
                detail,
            }
        })
        .collect()
}

fn render_report(report: &ReconciliationReport, colored: bool) -> String {
    let rows = report_rows(report);
    let mut out = if rows.is_empty() {
        "catalog is empty; nothing to reconcile".to_owned()
    } else {
        Table::new(rows).with(Style::rounded()).to_string()
    };

    let summary = format!(
        "{} in {}ms",
        report.summary(),
        report.elapsed().num_milliseconds()
    );
    let summary = if !colored {
        summary
    } else if report.has_failures() {
        summary.red().to_string()
    } else {
        summary.green().to_string()
    };
    let _ = write!(out, "\n{summary}");

    if !report.still_isolated.is_empty() {
        let names: Vec<&str> = report
            .still_isolated
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        let line = format!("still isolated (never auto-wired): {}", names.join(", "));
        let line = if colored { line.yellow().to_string() } else { line };
        let _ = write!(out, "\n{line}");
    }
    out
}

/// Spinner on stderr while the engine runs. Only for interactive table
/// output; structured formats stay clean for pipes.
fn progress_spinner(global: &GlobalOpts) -> Option<ProgressBar> {
    let interactive = matches!(global.output, OutputFormat::Table)
        && !global.quiet
        && std::io::stderr().is_terminal();
    if !interactive {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_message("reconciling lab wiring...");
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &ControllerClient,
    catalog_path: Option<PathBuf>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let path = util::require_catalog(catalog_path)?;
    let catalog = labmend_config::load_catalog(&path)?;

    let cancel = CancellationToken::new();
    let ctrl_c_guard = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current action then stopping");
            ctrl_c_guard.cancel();
        }
    });

    let spinner = progress_spinner(global);
    let report =
        labmend_core::reconcile(client, &catalog, ApplierPolicy::default(), &cancel).await?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let colored = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| render_report(r, colored),
        |r| {
            r.connections
                .iter()
                .map(labmend_core::ConnectionReport::audit_line)
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);

    if report.has_failures() {
        return Err(CliError::Unresolved {
            failed: report.failed_count(),
        });
    }
    Ok(())
}
