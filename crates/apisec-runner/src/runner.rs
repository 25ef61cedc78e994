// crates/apisec-runner/src/runner.rs
// ============================================================================
// Module: Collection Runner Execution
// Description: Runs an invocation once and maps the result to an exit code.
// Purpose: Propagate the external tool's exit status verbatim.
// Dependencies: serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`ProcessRunner`] spawns the collection runner exactly once with inherited
//! standard streams and blocks until it exits. There are no retries and no
//! timeout. Interrupts reach the child through the shared process group.
//!
//! Exit codes follow shell conventions so the wrapper can replace a shell
//! script: the child's code verbatim, `128 + N` for death by signal
//! `N`, `127` when the binary is missing, and `126` when it cannot be executed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::invocation::Invocation;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit code used when the runner binary cannot be found.
pub const EXIT_NOT_FOUND: u8 = 127;
/// Exit code used when the runner binary cannot be executed.
pub const EXIT_NOT_EXECUTABLE: u8 = 126;
/// Generic failure exit code.
pub const EXIT_FAILURE: u8 = 1;
/// Offset added to a signal number, as POSIX shells report it.
#[cfg(unix)]
const SIGNAL_EXIT_BASE: i32 = 128;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Terminal outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The runner exited with code 0.
    Passed,
    /// The runner exited non-zero or was killed.
    Failed,
}

/// Result of one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// Passed or failed.
    pub status: RunStatus,
    /// Exit code the wrapper must exit with.
    pub exit_code: u8,
    /// Wall-clock duration of the child process.
    pub duration: Duration,
}

impl RunOutcome {
    /// Builds an outcome from a raw exit code.
    #[must_use]
    pub const fn from_exit_code(exit_code: u8, duration: Duration) -> Self {
        let status = if exit_code == 0 { RunStatus::Passed } else { RunStatus::Failed };
        Self {
            status,
            exit_code,
            duration,
        }
    }

    /// Builds an outcome from a child exit status.
    #[must_use]
    pub fn from_status(status: ExitStatus, duration: Duration) -> Self {
        Self::from_exit_code(exit_code_for_status(status), duration)
    }
}

/// Failures to start or await the runner process.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The runner binary was not found.
    #[error("collection runner not found: {program}")]
    NotFound {
        /// Program that was looked up.
        program: String,
    },
    /// The runner binary exists but cannot be executed.
    #[error("collection runner not executable: {program}: {source}")]
    PermissionDenied {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Any other spawn failure.
    #[error("failed to start collection runner {program}: {source}")]
    Spawn {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// Waiting for the child failed.
    #[error("failed to wait for collection runner {program}: {source}")]
    Wait {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl RunnerError {
    /// Exit code the wrapper reports for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound {
                ..
            } => EXIT_NOT_FOUND,
            Self::PermissionDenied {
                ..
            } => EXIT_NOT_EXECUTABLE,
            Self::Spawn {
                ..
            }
            | Self::Wait {
                ..
            } => EXIT_FAILURE,
        }
    }

    /// Classifies a spawn error for `program`.
    fn from_spawn(program: &str, source: io::Error) -> Self {
        let program = program.to_string();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                program,
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                program,
                source,
            },
            _ => Self::Spawn {
                program,
                source,
            },
        }
    }
}

// ============================================================================
// SECTION: Runner Trait
// ============================================================================

/// Executes a collection-runner invocation.
pub trait CollectionRunner {
    /// Runs `invocation` once and reports its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] when the runner cannot be started or awaited.
    fn run(&self, invocation: &Invocation) -> Result<RunOutcome, RunnerError>;
}

/// Runs the invocation as a child process with inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CollectionRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<RunOutcome, RunnerError> {
        let program = invocation.program();
        tracing::info!(command = %invocation.display_command(), "starting collection run");
        let started = Instant::now();
        let mut child = Command::new(program)
            .args(invocation.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| RunnerError::from_spawn(program, err))?;
        let status = child.wait().map_err(|source| RunnerError::Wait {
            program: program.to_string(),
            source,
        })?;
        let outcome = RunOutcome::from_status(status, started.elapsed());
        tracing::info!(
            exit_code = outcome.exit_code,
            duration_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            "collection run finished"
        );
        Ok(outcome)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a child exit status to the wrapper's exit code.
#[must_use]
pub fn exit_code_for_status(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return clamp_exit_code(code);
    }
    signal_exit_code(status)
}

/// Converts a raw exit code into the 0-255 range; out-of-range codes fail.
#[must_use]
pub fn clamp_exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(EXIT_FAILURE)
}

/// Exit code for a child terminated by a signal.
#[cfg(unix)]
fn signal_exit_code(status: ExitStatus) -> u8 {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map_or(EXIT_FAILURE, |signal| clamp_exit_code(SIGNAL_EXIT_BASE + signal))
}

/// Exit code for a child without an exit code on non-unix targets.
#[cfg(not(unix))]
const fn signal_exit_code(_status: ExitStatus) -> u8 {
    EXIT_FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
