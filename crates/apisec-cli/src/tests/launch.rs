// crates/apisec-cli/src/tests/launch.rs
// ============================================================================
// Module: Launch Preparation Tests
// Description: Unit tests for binary precedence, extra args, and audit sinks.
// Purpose: Ensure flags, env, and config combine in a fixed order.
// ============================================================================

use std::collections::BTreeMap;
use std::fs;

use apisec_config::AuditSection;
use apisec_config::ValueSource;

use crate::launch::LaunchError;
use crate::launch::LaunchRequest;
use crate::launch::NEWMAN_BIN_ENV;
use crate::launch::audit_sink;
use crate::launch::prepare;

fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

#[test]
fn defaults_use_newman_on_path() {
    let launch = prepare(LaunchRequest::default(), &env(&[])).unwrap();
    assert_eq!(launch.invocation.program(), "newman");
    assert_eq!(launch.invocation.collection_path(), "tests/postman/collection.json");
    assert!(launch.config.source_path.is_none());
}

#[test]
fn binary_precedence_is_flag_then_env_then_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("apisec.toml");
    fs::write(&config_path, "[newman]\nbinary = \"/from/config\"\n").unwrap();

    let request = LaunchRequest {
        config_path: Some(config_path.clone()),
        ..LaunchRequest::default()
    };
    let launch = prepare(request.clone(), &env(&[])).unwrap();
    assert_eq!(launch.options.binary, "/from/config");

    let launch = prepare(request.clone(), &env(&[(NEWMAN_BIN_ENV, "/from/env")])).unwrap();
    assert_eq!(launch.options.binary, "/from/env");

    let flagged = LaunchRequest {
        newman_bin: Some("/from/flag".to_string()),
        ..request
    };
    let launch = prepare(flagged, &env(&[(NEWMAN_BIN_ENV, "/from/env")])).unwrap();
    assert_eq!(launch.options.binary, "/from/flag");
}

#[test]
fn config_extra_args_come_before_cli_extra_args() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("apisec.toml");
    fs::write(&config_path, "[newman]\nextra_args = [\"--color\", \"off\"]\n").unwrap();
    let request = LaunchRequest {
        config_path: Some(config_path),
        extra_args: vec!["--verbose".to_string()],
        ..LaunchRequest::default()
    };
    let args = prepare(request, &env(&[])).unwrap().invocation.args();
    let tail: Vec<&str> = args.iter().rev().take(4).rev().map(String::as_str).collect();
    assert_eq!(tail, ["--color", "off", "--verbose", "--bail"]);
}

#[test]
fn environment_overrides_config_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("apisec.toml");
    fs::write(&config_path, "[settings]\naccount_base_url = \"http://cfg:1\"\n").unwrap();
    let request = LaunchRequest {
        config_path: Some(config_path),
        ..LaunchRequest::default()
    };
    let launch = prepare(request.clone(), &env(&[])).unwrap();
    assert_eq!(launch.settings.account_base_url.source, ValueSource::ConfigFile);
    let launch = prepare(request, &env(&[("ACCOUNT_BASE_URL", "http://env:2")])).unwrap();
    assert_eq!(launch.settings.account_base_url.value, "http://env:2");
    assert!(launch.invocation.args().contains(&"accountBaseUrl=http://env:2".to_string()));
}

#[test]
fn invalid_config_reports_load_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("apisec.toml");
    fs::write(&config_path, "[newman]\nunknown = 1\n").unwrap();
    let request = LaunchRequest {
        config_path: Some(config_path),
        ..LaunchRequest::default()
    };
    let err = prepare(request, &env(&[])).unwrap_err();
    assert!(matches!(err, LaunchError::Config(_)));
    assert!(err.to_string().starts_with("Failed to load config"));
}

#[test]
fn audit_flag_opens_file_even_when_disabled_in_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let sink = audit_sink(Some(&path), &AuditSection::default());
    assert!(sink.is_ok());
    assert!(path.exists());
}

#[test]
fn audit_file_in_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("audit.jsonl");
    let audit = AuditSection {
        enabled: true,
        path: Some(path.to_string_lossy().into_owned()),
    };
    let Err(err) = audit_sink(None, &audit) else {
        panic!("expected audit open failure");
    };
    assert!(matches!(err, LaunchError::AuditLog { .. }));
}
