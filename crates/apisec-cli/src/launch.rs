// crates/apisec-cli/src/launch.rs
// ============================================================================
// Module: Launch Preparation
// Description: Combines config file, environment, and flags into one invocation.
// Purpose: Keep every CLI command on the same resolution path.
// Dependencies: apisec-config, apisec-runner, tracing
// ============================================================================

//! ## Overview
//! `run`, `plan`, and `config show` all resolve the same way: load the
//! optional config file, resolve the eight settings, then pick the runner
//! binary (`--newman-bin`, then `NEWMAN_BIN`, then `newman.binary`). Only the
//! audit sink is specific to `run`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use apisec_config::AuditSection;
use apisec_config::ConfigError;
use apisec_config::EnvSource;
use apisec_config::RunnerConfig;
use apisec_config::RunnerSettings;
use apisec_runner::FileAuditSink;
use apisec_runner::Invocation;
use apisec_runner::NewmanOptions;
use apisec_runner::NoopAuditSink;
use apisec_runner::RunAuditSink;
use apisec_runner::StderrAuditSink;

use crate::t;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable overriding the runner binary.
pub const NEWMAN_BIN_ENV: &str = "NEWMAN_BIN";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs from the command line.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    /// Explicit config file path.
    pub config_path: Option<PathBuf>,
    /// Explicit runner binary.
    pub newman_bin: Option<String>,
    /// Arguments forwarded to the runner before the fail-fast flag.
    pub extra_args: Vec<String>,
}

/// Everything needed to run, plan, or display a collection run.
#[derive(Debug, Clone)]
pub struct Launch {
    /// Loaded configuration (default when no file was selected).
    pub config: RunnerConfig,
    /// Resolved settings.
    pub settings: RunnerSettings,
    /// Effective runner options.
    pub options: NewmanOptions,
    /// Final invocation.
    pub invocation: Invocation,
}

/// Launch preparation failures.
#[derive(Debug)]
pub enum LaunchError {
    /// The config file could not be loaded.
    Config(ConfigError),
    /// The audit log could not be opened.
    AuditLog {
        /// Audit log path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl fmt::Display for LaunchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Config(error) => t!("config.load_failed", error = error),
            Self::AuditLog {
                path,
                source,
            } => t!("audit.open_failed", path = path.display(), error = source),
        };
        write!(f, "{message}")
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            Self::AuditLog {
                source, ..
            } => Some(source),
        }
    }
}

impl From<ConfigError> for LaunchError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

// ============================================================================
// SECTION: Preparation
// ============================================================================

/// Resolves config, settings, and runner options into an invocation.
///
/// # Errors
///
/// Returns [`LaunchError::Config`] when a selected config file is invalid.
pub fn prepare(request: LaunchRequest, env: &impl EnvSource) -> Result<Launch, LaunchError> {
    let config = RunnerConfig::load(request.config_path.as_deref(), env)?;
    let settings = RunnerSettings::resolve(env, &config.settings);
    let options = NewmanOptions::from_config(&config.newman)
        .with_binary_override(env.non_empty(NEWMAN_BIN_ENV))
        .with_binary_override(request.newman_bin)
        .with_extra_args(request.extra_args);
    let invocation = Invocation::newman(&settings, &options);
    tracing::debug!(command = %invocation.display_command(), "prepared invocation");
    Ok(Launch {
        config,
        settings,
        options,
        invocation,
    })
}

/// Selects the audit sink for a run.
///
/// `--audit-log` always enables file auditing; otherwise the `[audit]` table
/// decides between a file, stderr, or nothing.
///
/// # Errors
///
/// Returns [`LaunchError::AuditLog`] when the audit file cannot be opened.
pub fn audit_sink(
    flag: Option<&Path>,
    audit: &AuditSection,
) -> Result<Box<dyn RunAuditSink>, LaunchError> {
    let path = match (flag, audit.enabled, audit.path.as_deref()) {
        (Some(path), _, _) => path.to_path_buf(),
        (None, true, Some(path)) => PathBuf::from(path),
        (None, true, None) => return Ok(Box::new(StderrAuditSink)),
        (None, false, _) => return Ok(Box::new(NoopAuditSink)),
    };
    let sink = FileAuditSink::new(&path).map_err(|source| LaunchError::AuditLog {
        path,
        source,
    })?;
    Ok(Box::new(sink))
}
