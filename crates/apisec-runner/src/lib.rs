// crates/apisec-runner/src/lib.rs
// ============================================================================
// Module: apisec Runner Library
// Description: Builds and executes the compliance collection run.
// Purpose: One fail-fast runner invocation with exit-code passthrough.
// Dependencies: apisec-config, serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! The runner turns resolved settings into a single newman invocation,
//! executes it through a [`CollectionRunner`], and reports the outcome to a
//! [`RunAuditSink`]. The wrapper's exit code is the runner's exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod invocation;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RunAuditEvent;
pub use audit::RunAuditSink;
pub use audit::StderrAuditSink;
pub use invocation::FAIL_FAST_FLAG;
pub use invocation::Invocation;
pub use invocation::InvocationPlan;
pub use invocation::NewmanOptions;
pub use invocation::RuntimeVariable;
pub use runner::CollectionRunner;
pub use runner::ProcessRunner;
pub use runner::RunOutcome;
pub use runner::RunStatus;
pub use runner::RunnerError;

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs `invocation` once through `runner` and records the result to `audit`.
///
/// # Errors
///
/// Returns [`RunnerError`] when the runner cannot be started or awaited. The
/// audit event is recorded in both cases.
pub fn execute(
    invocation: &Invocation,
    runner: &impl CollectionRunner,
    audit: &dyn RunAuditSink,
) -> Result<RunOutcome, RunnerError> {
    let result = runner.run(invocation);
    if let Err(err) = &result {
        tracing::debug!(error = %err, "collection runner invocation failed");
    }
    audit.record(&RunAuditEvent::new(invocation, &result));
    result
}
