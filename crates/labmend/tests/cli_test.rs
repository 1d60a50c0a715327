//! Integration tests for the `labmend` CLI binary.
//!
//! Parsing, help output, shell completions, error handling, offline
//! catalog validation, and two end-to-end runs against a mock
//! controller — none of it needs a real lab.
#![allow(clippy::unwrap_used)]

use std::io::Write as _;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "6b2b36a0-8a0a-4c55-96a8-856c7321a91b";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `labmend` binary with env isolation.
///
/// Clears all `LABMEND_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn labmend_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("labmend");
    cmd.env("HOME", "/tmp/labmend-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/labmend-cli-test-nonexistent")
        .env_remove("LABMEND_PROFILE")
        .env_remove("LABMEND_CONTROLLER")
        .env_remove("LABMEND_PROJECT")
        .env_remove("LABMEND_CATALOG")
        .env_remove("LABMEND_OUTPUT")
        .env_remove("LABMEND_INSECURE")
        .env_remove("LABMEND_TIMEOUT")
        .env_remove("LABMEND_USERNAME")
        .env_remove("LABMEND_PASSWORD");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Write a catalog file into a temp dir and return the guard plus path.
fn write_catalog(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    (dir, path)
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = labmend_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("Usage"),
        "Expected 'Usage' in output:\n{text}"
    );
}

#[test]
fn test_help_flag() {
    labmend_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("plan")
            .and(predicate::str::contains("apply"))
            .and(predicate::str::contains("topology"))
            .and(predicate::str::contains("catalog")),
    );
}

#[test]
fn test_version_flag() {
    labmend_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("labmend"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    labmend_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    labmend_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    labmend_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = labmend_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_plan_no_controller_configured() {
    labmend_cmd().arg("plan").assert().failure().stderr(
        predicate::str::contains("config")
            .or(predicate::str::contains("Configuration"))
            .or(predicate::str::contains("controller"))
            .or(predicate::str::contains("profile")),
    );
}

#[test]
fn test_invalid_output_format() {
    let output = labmend_cmd()
        .args(["--output", "invalid", "plan"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_global_flags_parsing() {
    // All flags should parse correctly; the failure should be about
    // missing controller config, not about argument parsing.
    labmend_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--insecure",
            "--timeout",
            "60",
            "plan",
        ])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("config")
                .or(predicate::str::contains("Configuration"))
                .or(predicate::str::contains("controller"))
                .or(predicate::str::contains("profile")),
        );
}

#[test]
fn test_project_must_be_a_uuid() {
    let output = labmend_cmd()
        .args([
            "--controller",
            "http://127.0.0.1:9",
            "--project",
            "not-a-uuid",
            "ping",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("UUID") || text.contains("project"),
        "Expected project UUID validation error:\n{text}"
    );
}

// ── Aliases & subcommand help discovery ─────────────────────────────

#[test]
fn test_topo_alias() {
    labmend_cmd()
        .args(["topo", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topology").or(predicate::str::contains("links")));
}

#[test]
fn test_reconcile_alias() {
    labmend_cmd()
        .args(["reconcile", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reconcile"));
}

#[test]
fn test_nodes_subcommands_exist() {
    labmend_cmd()
        .args(["nodes", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("start")
                .and(predicate::str::contains("stop"))
                .and(predicate::str::contains("start-all"))
                .and(predicate::str::contains("stop-all")),
        );
}

#[test]
fn test_links_subcommands_exist() {
    labmend_cmd()
        .args(["links", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list").and(predicate::str::contains("delete")));
}

#[test]
fn test_config_subcommands_exist() {
    labmend_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("profiles"))
                .and(predicate::str::contains("set-password")),
        );
}

// ── Config (no controller needed) ───────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // `config show` uses load_config_or_default() so it succeeds even
    // when no config file exists; it just renders the default config.
    labmend_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_path_prints_toml_path() {
    labmend_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Offline catalog validation ──────────────────────────────────────

#[test]
fn test_catalog_check_valid_file() {
    let (_dir, path) = write_catalog(
        r#"
[[connection]]
a = "SW-LAN"
b = "PC1"
priority = "critical"

[[connection]]
a = "SW-LAN"
b = "FW-EDGE"
"#,
    );
    labmend_cmd()
        .args(["--catalog", path.to_str().unwrap(), "catalog", "check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("2 connections"));
}

#[test]
fn test_catalog_check_rejects_self_loop() {
    let (_dir, path) = write_catalog(
        r#"
[[connection]]
a = "SW-LAN"
b = "SW-LAN"
"#,
    );
    let output = labmend_cmd()
        .args(["--catalog", path.to_str().unwrap(), "catalog", "check"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("itself"),
        "Expected self-loop validation error:\n{text}"
    );
}

// ── End-to-end against a mock controller ────────────────────────────
//
// assert_cmd blocks a worker thread while the mock server answers on
// another, so these need the multi-thread runtime.

#[tokio::test(flavor = "multi_thread")]
async fn test_ping_reports_controller_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "version": "2.2.54",
            "local": true
        })))
        .mount(&server)
        .await;

    labmend_cmd()
        .args(["--controller", &server.uri(), "--project", PROJECT, "ping"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2.2.54"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_plan_reports_missing_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{PROJECT}/nodes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "node_id": "0e30577d-3433-4211-8705-65ac1e001a24",
                "name": "SW-LAN",
                "node_type": "ethernet_switch",
                "status": "started"
            },
            {
                "node_id": "24d3ab5f-ae91-42c6-865c-54e1d966e0b5",
                "name": "PC1",
                "node_type": "vpcs",
                "status": "started"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/projects/{PROJECT}/links")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let (_dir, catalog) = write_catalog(
        r#"
[[connection]]
a = "SW-LAN"
b = "PC1"
priority = "high"
"#,
    );

    labmend_cmd()
        .args([
            "--controller",
            &server.uri(),
            "--project",
            PROJECT,
            "--catalog",
            catalog.to_str().unwrap(),
            "plan",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("create link").and(predicate::str::contains("1 to repair")),
        );
}
