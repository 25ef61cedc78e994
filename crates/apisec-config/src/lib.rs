// crates/apisec-config/src/lib.rs
// ============================================================================
// Module: apisec Config Library
// Description: Setting catalog, environment resolution, and config file model.
// Purpose: Single source of truth for what a collection run is configured with.
// Dependencies: serde, thiserror, toml, tracing
// ============================================================================

//! ## Overview
//! `apisec-config` names the eight settings a compliance collection run
//! consumes, resolves them from the environment with documented defaults, and
//! optionally layers a strict TOML config file underneath the environment.
//!
//! Security posture: the client secret and password are flagged as secrets and
//! are masked wherever resolved settings are rendered.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use settings::*;
