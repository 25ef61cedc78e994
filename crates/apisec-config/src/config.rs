// crates/apisec-config/src/config.rs
// ============================================================================
// Module: Runner Configuration File
// Description: Optional TOML configuration layered beneath the environment.
// Purpose: Provide strict, bounded config parsing for collection runs.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! A config file is optional. When no path is given on the command line and
//! `APISEC_CONFIG` is unset, an empty configuration is used and every setting
//! comes from the environment or its documented default. When a file is
//! named it must exist, stay within size and path limits, and contain only
//! known keys.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::settings::EnvSource;
use crate::settings::Setting;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable used to point at a config file.
pub const CONFIG_ENV_VAR: &str = "APISEC_CONFIG";
/// Collection runner binary used when nothing overrides it.
pub const DEFAULT_NEWMAN_BINARY: &str = "newman";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of extra runner arguments.
pub(crate) const MAX_EXTRA_ARGS: usize = 64;
/// Maximum length of one extra runner argument.
pub(crate) const MAX_EXTRA_ARG_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Setting values used when the environment leaves them unset.
    #[serde(default)]
    pub settings: SettingsSection,
    /// Collection runner options.
    #[serde(default)]
    pub newman: NewmanSection,
    /// Run audit options.
    #[serde(default)]
    pub audit: AuditSection,
    /// Path the configuration was loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Optional per-setting values from the `[settings]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsSection {
    /// Collection file path.
    #[serde(default)]
    pub collection_path: Option<String>,
    /// Auth service base URL.
    #[serde(default)]
    pub auth_base_url: Option<String>,
    /// Account service base URL.
    #[serde(default)]
    pub account_base_url: Option<String>,
    /// Transaction service base URL.
    #[serde(default)]
    pub transaction_base_url: Option<String>,
    /// OAuth client identifier.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Resource-owner username.
    #[serde(default)]
    pub username: Option<String>,
    /// Resource-owner password.
    #[serde(default)]
    pub password: Option<String>,
}

impl SettingsSection {
    /// Returns the configured value for `setting`, if any.
    #[must_use]
    pub fn get(&self, setting: Setting) -> Option<&str> {
        let value = match setting {
            Setting::CollectionPath => &self.collection_path,
            Setting::AuthBaseUrl => &self.auth_base_url,
            Setting::AccountBaseUrl => &self.account_base_url,
            Setting::TransactionBaseUrl => &self.transaction_base_url,
            Setting::ClientId => &self.client_id,
            Setting::ClientSecret => &self.client_secret,
            Setting::Username => &self.username,
            Setting::Password => &self.password,
        };
        value.as_deref()
    }
}

/// Collection runner options from the `[newman]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewmanSection {
    /// Runner binary name or path.
    #[serde(default = "default_newman_binary")]
    pub binary: String,
    /// Extra arguments inserted before the fail-fast flag.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for NewmanSection {
    fn default() -> Self {
        Self {
            binary: default_newman_binary(),
            extra_args: Vec::new(),
        }
    }
}

impl NewmanSection {
    /// Validates runner options.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("newman.binary", &self.binary)?;
        if self.binary.trim() != self.binary {
            return Err(ConfigError::Invalid(
                "newman.binary must not have surrounding whitespace".to_string(),
            ));
        }
        if self.extra_args.len() > MAX_EXTRA_ARGS {
            return Err(ConfigError::Invalid("too many newman.extra_args entries".to_string()));
        }
        if self.extra_args.iter().any(|arg| arg.len() > MAX_EXTRA_ARG_LENGTH) {
            return Err(ConfigError::Invalid(
                "newman.extra_args entry exceeds max length".to_string(),
            ));
        }
        Ok(())
    }
}

/// Run audit options from the `[audit]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    /// Emit a run audit event when true.
    #[serde(default)]
    pub enabled: bool,
    /// JSON-lines file for audit events; stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditSection {
    /// Validates audit options.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

impl RunnerConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// An explicit `path` wins, then `APISEC_CONFIG` from `env`. With neither,
    /// an empty configuration is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a named file cannot be read, parsed, or
    /// validated.
    pub fn load(path: Option<&Path>, env: &impl EnvSource) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path, env)? else {
            tracing::debug!("no config file selected; using environment and defaults");
            return Ok(Self::default());
        };
        validate_path(&resolved)?;
        let bytes = read_bounded(&resolved)?;
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        tracing::debug!(path = %resolved.display(), "loaded config file");
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.newman.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default runner binary for serde.
fn default_newman_binary() -> String {
    DEFAULT_NEWMAN_BINARY.to_string()
}

/// Resolves the config path from CLI or environment.
fn resolve_path(path: Option<&Path>, env: &impl EnvSource) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    let Some(env_path) = env.non_empty(CONFIG_ENV_VAR) else {
        return Ok(None);
    };
    if env_path.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    Ok(Some(PathBuf::from(env_path)))
}

/// Reads at most one byte past the size limit so unbounded sources fail fast.
fn read_bounded(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let io_error = |err: std::io::Error| ConfigError::Io(format!("{}: {err}", path.display()));
    let file = File::open(path).map_err(io_error)?;
    let limit = u64::try_from(MAX_CONFIG_FILE_SIZE).unwrap_or(u64::MAX);
    if file.metadata().map_err(io_error)?.len() > limit {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(io_error)?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    Ok(bytes)
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against emptiness and length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
