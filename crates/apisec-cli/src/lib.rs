// crates/apisec-cli/src/lib.rs
// ============================================================================
// Module: apisec CLI Library
// Description: Shared helpers for the apisec-runner command-line interface.
// Purpose: Provide reusable components for the CLI binary and tests.
// Dependencies: apisec-config, apisec-runner
// ============================================================================

//! ## Overview
//! This library houses the message catalog and the launch preparation shared
//! by every subcommand. The binary entry point (`src/main.rs`) imports these
//! helpers to keep resolution and output consistent.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod launch;
/// Message catalog and rendering helpers.
pub mod messages;

#[cfg(test)]
mod tests;
