// crates/apisec-cli/tests/config_commands.rs
// ============================================================================
// Module: CLI Config Command Tests
// Description: Integration tests for `config show` and `config validate`.
// Purpose: Ensure provenance is reported and secrets stay masked.
// Dependencies: apisec-runner binary, serde_json, tempfile
// ============================================================================
//! ## Overview
//! Exercises config selection through `--config` and `APISEC_CONFIG`, and the
//! environment-over-file precedence as reported by `config show`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn runner_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_apisec-runner"))
}

fn clean_command() -> Command {
    let mut command = Command::new(runner_bin());
    command.env_clear();
    command
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("apisec.toml");
    let config = r#"
[settings]
auth_base_url = "http://auth.internal:8001"
client_secret = "from-file-secret"
username = ""

[newman]
binary = "/opt/newman/bin/newman"
extra_args = ["--timeout-request", "5000"]
"#;
    fs::write(&path, config.trim()).expect("write config");
    path
}

fn setting<'a>(view: &'a Value, env_var: &str) -> &'a Value {
    view["settings"]
        .as_array()
        .expect("settings array")
        .iter()
        .find(|entry| entry["env_var"] == env_var)
        .expect("setting present")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies `config show` reports file values, env overrides, and defaults.
#[test]
fn config_show_reports_provenance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());
    let output = clean_command()
        .env("CLIENT_ID", "env-client")
        .args(["config", "show", "--format", "json", "--config"])
        .arg(&config)
        .output()
        .expect("run config show");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let view: Value = serde_json::from_slice(&output.stdout).expect("json");

    assert_eq!(view["config_file"], config.display().to_string());
    assert_eq!(view["newman_binary"], "/opt/newman/bin/newman");
    assert_eq!(view["newman_extra_args"][1], "5000");

    let auth = setting(&view, "AUTH_BASE_URL");
    assert_eq!(auth["value"], "http://auth.internal:8001");
    assert_eq!(auth["source"], "config_file");

    let client = setting(&view, "CLIENT_ID");
    assert_eq!(client["value"], "env-client");
    assert_eq!(client["source"], "environment");

    let username = setting(&view, "USERNAME");
    assert_eq!(username["value"], "analyst@example.com");
    assert_eq!(username["source"], "default");

    let secret = setting(&view, "CLIENT_SECRET");
    assert_eq!(secret["value"], "********");
    assert_eq!(secret["source"], "config_file");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("from-file-secret"));
}

/// Verifies `APISEC_CONFIG` selects the file when no flag is given.
#[test]
fn config_show_text_uses_env_selected_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());
    let output = clean_command()
        .env("APISEC_CONFIG", &config)
        .args(["config", "show"])
        .output()
        .expect("run config show");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("config file: {}", config.display())));
    assert!(stdout.contains("AUTH_BASE_URL=http://auth.internal:8001 (config_file)"));
    assert!(stdout.contains("PASSWORD=******** (default)"));
    assert!(stdout.contains("newman extra args: --timeout-request 5000"));
}

/// Verifies `config show` works with no file at all.
#[test]
fn config_show_without_file_uses_defaults() {
    let output = clean_command().args(["config", "show"]).output().expect("run config show");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("config file: (none)"));
    assert!(stdout.contains("COLLECTION_PATH=tests/postman/collection.json (default)"));
    assert!(stdout.contains("newman binary: newman"));
    assert!(stdout.contains("newman extra args: (none)"));
}

/// Verifies `config validate` accepts a well-formed file.
#[test]
fn config_validate_accepts_valid_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());
    let output = clean_command()
        .args(["config", "validate", "--config"])
        .arg(&config)
        .output()
        .expect("run config validate");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Config valid: "), "unexpected stdout: {stdout}");
}

/// Verifies `config validate` rejects malformed TOML.
#[test]
fn config_validate_rejects_malformed_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[settings\nauth_base_url = 1").expect("write config");
    let output = clean_command()
        .args(["config", "validate", "--config"])
        .arg(&path)
        .output()
        .expect("run config validate");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config parse error"), "unexpected stderr: {stderr}");
}

/// Verifies `config validate` without any selection reports that no file applies.
#[test]
fn config_validate_without_selection() {
    let output =
        clean_command().args(["config", "validate"]).output().expect("run config validate");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No config file selected"));
}

/// Verifies a missing selected file is an error rather than a silent default.
#[test]
fn config_validate_rejects_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = clean_command()
        .env("APISEC_CONFIG", dir.path().join("absent.toml"))
        .args(["config", "validate"])
        .output()
        .expect("run config validate");
    assert_eq!(output.status.code(), Some(1));
}
