// crates/apisec-runner/src/audit.rs
// ============================================================================
// Module: Run Audit Logging
// Description: Structured audit events for collection runs.
// Purpose: Record what was run and how it ended without leaking secrets.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each collection run can emit one JSON-lines audit event describing the
//! invocation (program, collection, base URLs, runtime variable names) and its
//! outcome. Secret values are never part of the event; only variable names are
//! recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::invocation::FAIL_FAST_FLAG;
use crate::invocation::Invocation;
use crate::runner::RunOutcome;
use crate::runner::RunStatus;
use crate::runner::RunnerError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome classification recorded in audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Runner exited 0.
    Passed,
    /// Runner exited non-zero or was killed.
    Failed,
    /// Runner could not be started or awaited.
    InvocationError,
}

/// Collection run audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RunAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Runner binary.
    pub program: String,
    /// Collection path passed to the runner.
    pub collection_path: String,
    /// Service base URLs keyed by runtime variable name.
    pub base_urls: BTreeMap<String, String>,
    /// Runtime variable names passed to the runner.
    pub runtime_variables: Vec<&'static str>,
    /// Whether the fail-fast flag was present.
    pub fail_fast: bool,
    /// Run outcome.
    pub outcome: AuditOutcome,
    /// Exit code reported by the wrapper.
    pub exit_code: u8,
    /// Child duration in milliseconds, absent on invocation errors.
    pub duration_ms: Option<u128>,
    /// Invocation error message, when any.
    pub error: Option<String>,
    /// Redaction classification.
    pub redaction: &'static str,
}

impl RunAuditEvent {
    /// Builds an event for a completed or failed run.
    #[must_use]
    pub fn new(invocation: &Invocation, result: &Result<RunOutcome, RunnerError>) -> Self {
        let base_urls = invocation
            .variables()
            .iter()
            .filter(|variable| variable.setting.is_base_url())
            .map(|variable| (variable.name.to_string(), variable.value.clone()))
            .collect();
        let (outcome, exit_code, duration_ms, error) = match result {
            Ok(run) => {
                let outcome = match run.status {
                    RunStatus::Passed => AuditOutcome::Passed,
                    RunStatus::Failed => AuditOutcome::Failed,
                };
                (outcome, run.exit_code, Some(run.duration.as_millis()), None)
            }
            Err(err) => (AuditOutcome::InvocationError, err.exit_code(), None, Some(err.to_string())),
        };
        Self {
            event: "collection_run",
            timestamp_ms: now_ms(),
            program: invocation.program().to_string(),
            collection_path: invocation.collection_path().to_string(),
            base_urls,
            runtime_variables: invocation.variables().iter().map(|variable| variable.name).collect(),
            fail_fast: invocation.args().last().is_some_and(|arg| arg == FAIL_FAST_FLAG),
            outcome,
            exit_code,
            duration_ms,
            error,
            redaction: "secrets_omitted",
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for collection run events.
pub trait RunAuditSink {
    /// Record an audit event.
    fn record(&self, event: &RunAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl RunAuditSink for StderrAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RunAuditSink for FileAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl RunAuditSink for NoopAuditSink {
    fn record(&self, _event: &RunAuditEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds since the unix epoch, zero if the clock is before it.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_millis())
}
