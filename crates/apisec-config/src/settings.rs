// crates/apisec-config/src/settings.rs
// ============================================================================
// Module: Runner Settings
// Description: Catalog of the collection-run settings and their resolution.
// Purpose: Resolve every setting from env, config file, or documented default.
// Dependencies: serde, tracing
// ============================================================================

//! ## Overview
//! Eight settings drive a collection run: the collection path, three service
//! base URLs, and the OAuth client and user credentials. Each setting is read
//! from the environment when set and non-empty, falls back to the optional
//! config file, and finally to its documented default.
//!
//! ## Invariants
//! - Every setting always resolves to a string value.
//! - Values are passed through verbatim; no URL or path validation happens here.
//! - Resolution is pure for a given environment and config file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::config::SettingsSection;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder rendered in place of secret values.
pub const REDACTED: &str = "********";

// ============================================================================
// SECTION: Setting Catalog
// ============================================================================

/// A recognized collection-run setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    /// Path to the Postman collection file.
    CollectionPath,
    /// Base URL of the auth service.
    AuthBaseUrl,
    /// Base URL of the account service.
    AccountBaseUrl,
    /// Base URL of the transaction service.
    TransactionBaseUrl,
    /// OAuth client identifier.
    ClientId,
    /// OAuth client secret.
    ClientSecret,
    /// Resource-owner username.
    Username,
    /// Resource-owner password.
    Password,
}

impl Setting {
    /// All settings in catalog order.
    pub const ALL: [Self; 8] = [
        Self::CollectionPath,
        Self::AuthBaseUrl,
        Self::AccountBaseUrl,
        Self::TransactionBaseUrl,
        Self::ClientId,
        Self::ClientSecret,
        Self::Username,
        Self::Password,
    ];

    /// Environment variable consulted for this setting.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::CollectionPath => "COLLECTION_PATH",
            Self::AuthBaseUrl => "AUTH_BASE_URL",
            Self::AccountBaseUrl => "ACCOUNT_BASE_URL",
            Self::TransactionBaseUrl => "TRANSACTION_BASE_URL",
            Self::ClientId => "CLIENT_ID",
            Self::ClientSecret => "CLIENT_SECRET",
            Self::Username => "USERNAME",
            Self::Password => "PASSWORD",
        }
    }

    /// Runtime variable name exposed to the collection.
    ///
    /// The collection path is passed positionally and has no runtime variable.
    #[must_use]
    pub const fn runtime_variable(self) -> Option<&'static str> {
        match self {
            Self::CollectionPath => None,
            Self::AuthBaseUrl => Some("authBaseUrl"),
            Self::AccountBaseUrl => Some("accountBaseUrl"),
            Self::TransactionBaseUrl => Some("transactionBaseUrl"),
            Self::ClientId => Some("clientId"),
            Self::ClientSecret => Some("clientSecret"),
            Self::Username => Some("username"),
            Self::Password => Some("password"),
        }
    }

    /// Documented default used when neither env nor config supplies a value.
    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::CollectionPath => "tests/postman/collection.json",
            Self::AuthBaseUrl => "http://localhost:8001",
            Self::AccountBaseUrl => "http://localhost:8002",
            Self::TransactionBaseUrl => "http://localhost:8003",
            Self::ClientId => "web-portal",
            Self::ClientSecret => "change-me",
            Self::Username => "analyst@example.com",
            Self::Password => "P@ssw0rd!",
        }
    }

    /// Returns true when the value must never be displayed or logged.
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::ClientSecret | Self::Password)
    }

    /// Returns true for the service base URL settings.
    #[must_use]
    pub const fn is_base_url(self) -> bool {
        matches!(self, Self::AuthBaseUrl | Self::AccountBaseUrl | Self::TransactionBaseUrl)
    }

    /// Key used for this setting in the `[settings]` config table.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::CollectionPath => "collection_path",
            Self::AuthBaseUrl => "auth_base_url",
            Self::AccountBaseUrl => "account_base_url",
            Self::TransactionBaseUrl => "transaction_base_url",
            Self::ClientId => "client_id",
            Self::ClientSecret => "client_secret",
            Self::Username => "username",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

// ============================================================================
// SECTION: Environment Sources
// ============================================================================

/// Lookup of environment-style variables.
pub trait EnvSource {
    /// Returns the raw value of `key`, or `None` when unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns the value of `key` only when it is set and non-empty.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.is_empty())
    }
}

/// Reads variables from the current process environment.
///
/// Non UTF-8 values are converted lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

// ============================================================================
// SECTION: Resolved Values
// ============================================================================

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Process environment.
    Environment,
    /// `[settings]` table of the config file.
    ConfigFile,
    /// Documented default.
    Default,
}

impl ValueSource {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::ConfigFile => "config_file",
            Self::Default => "default",
        }
    }
}

/// A setting value together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedValue {
    /// Raw value, passed through without validation.
    pub value: String,
    /// Provenance of the value.
    pub source: ValueSource,
}

impl ResolvedValue {
    /// Returns the value, masked when `secret` is true.
    #[must_use]
    pub fn display_value(&self, secret: bool) -> &str {
        if secret { REDACTED } else { &self.value }
    }
}

/// Fully resolved settings for one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Collection file path.
    pub collection_path: ResolvedValue,
    /// Auth service base URL.
    pub auth_base_url: ResolvedValue,
    /// Account service base URL.
    pub account_base_url: ResolvedValue,
    /// Transaction service base URL.
    pub transaction_base_url: ResolvedValue,
    /// OAuth client identifier.
    pub client_id: ResolvedValue,
    /// OAuth client secret.
    pub client_secret: ResolvedValue,
    /// Resource-owner username.
    pub username: ResolvedValue,
    /// Resource-owner password.
    pub password: ResolvedValue,
}

impl RunnerSettings {
    /// Resolves every setting: env when set and non-empty, then the config
    /// file when set and non-empty, then the documented default.
    #[must_use]
    pub fn resolve(env: &impl EnvSource, file: &SettingsSection) -> Self {
        let pick = |setting: Setting| resolve_one(setting, env, file);
        let settings = Self {
            collection_path: pick(Setting::CollectionPath),
            auth_base_url: pick(Setting::AuthBaseUrl),
            account_base_url: pick(Setting::AccountBaseUrl),
            transaction_base_url: pick(Setting::TransactionBaseUrl),
            client_id: pick(Setting::ClientId),
            client_secret: pick(Setting::ClientSecret),
            username: pick(Setting::Username),
            password: pick(Setting::Password),
        };
        for (setting, resolved) in settings.iter() {
            tracing::debug!(
                setting = setting.env_var(),
                source = resolved.source.as_str(),
                value = resolved.display_value(setting.is_secret()),
                "resolved setting"
            );
        }
        settings
    }

    /// Resolves settings from the process environment with no config file.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self::resolve(&ProcessEnv, &SettingsSection::default())
    }

    /// Returns the resolved value for `setting`.
    #[must_use]
    pub const fn get(&self, setting: Setting) -> &ResolvedValue {
        match setting {
            Setting::CollectionPath => &self.collection_path,
            Setting::AuthBaseUrl => &self.auth_base_url,
            Setting::AccountBaseUrl => &self.account_base_url,
            Setting::TransactionBaseUrl => &self.transaction_base_url,
            Setting::ClientId => &self.client_id,
            Setting::ClientSecret => &self.client_secret,
            Setting::Username => &self.username,
            Setting::Password => &self.password,
        }
    }

    /// Iterates settings in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Setting, &ResolvedValue)> {
        Setting::ALL.into_iter().map(move |setting| (setting, self.get(setting)))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves a single setting through the precedence chain.
fn resolve_one(setting: Setting, env: &impl EnvSource, file: &SettingsSection) -> ResolvedValue {
    if let Some(value) = env.non_empty(setting.env_var()) {
        return ResolvedValue {
            value,
            source: ValueSource::Environment,
        };
    }
    if let Some(value) = file.get(setting).filter(|value| !value.is_empty()) {
        return ResolvedValue {
            value: value.to_string(),
            source: ValueSource::ConfigFile,
        };
    }
    ResolvedValue {
        value: setting.default_value().to_string(),
        source: ValueSource::Default,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
