// crates/apisec-runner/src/invocation.rs
// ============================================================================
// Module: Collection Runner Invocation
// Description: Assembles the single external collection-runner command line.
// Purpose: Turn resolved settings into newman arguments with fail-fast forced.
// Dependencies: apisec-config, serde
// ============================================================================

//! ## Overview
//! An [`Invocation`] is the exact argument vector handed to the collection
//! runner: `run <collection>`, one `--env-var name=value` pair per runtime
//! variable, optional extra arguments, and `--bail` last.
//!
//! ## Invariants
//! - `--bail` is always the final argument; no option removes it.
//! - Values are passed verbatim; secrets are masked only in redacted views.
//! - The same settings and options always produce the same arguments.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use apisec_config::DEFAULT_NEWMAN_BINARY;
use apisec_config::NewmanSection;
use apisec_config::REDACTED;
use apisec_config::RunnerSettings;
use apisec_config::Setting;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Runner subcommand that executes a collection.
pub const RUN_SUBCOMMAND: &str = "run";
/// Flag that introduces one runtime variable.
pub const ENV_VAR_FLAG: &str = "--env-var";
/// Flag that stops the run at the first failing request or assertion.
pub const FAIL_FAST_FLAG: &str = "--bail";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Runner options that are not part of the eight settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewmanOptions {
    /// Runner binary name or path.
    pub binary: String,
    /// Extra arguments placed before the fail-fast flag.
    pub extra_args: Vec<String>,
}

impl Default for NewmanOptions {
    fn default() -> Self {
        Self {
            binary: DEFAULT_NEWMAN_BINARY.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl NewmanOptions {
    /// Builds options from the `[newman]` config table.
    #[must_use]
    pub fn from_config(section: &NewmanSection) -> Self {
        Self {
            binary: section.binary.clone(),
            extra_args: section.extra_args.clone(),
        }
    }

    /// Replaces the binary when `binary` is set.
    #[must_use]
    pub fn with_binary_override(mut self, binary: Option<String>) -> Self {
        if let Some(binary) = binary.filter(|value| !value.trim().is_empty()) {
            self.binary = binary;
        }
        self
    }

    /// Appends extra arguments after any configured ones.
    #[must_use]
    pub fn with_extra_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }
}

// ============================================================================
// SECTION: Invocation
// ============================================================================

/// One named runtime variable exposed to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeVariable {
    /// Setting the value was resolved from.
    pub setting: Setting,
    /// Runtime variable name seen by the collection.
    pub name: &'static str,
    /// Raw value.
    pub value: String,
}

impl RuntimeVariable {
    /// Returns the `name=value` pair passed to the runner.
    #[must_use]
    pub fn assignment(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Returns the `name=value` pair with secrets masked.
    #[must_use]
    pub fn redacted_assignment(&self) -> String {
        if self.setting.is_secret() {
            format!("{}={REDACTED}", self.name)
        } else {
            self.assignment()
        }
    }
}

/// The complete command handed to the collection runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Runner binary name or path.
    program: String,
    /// Positional collection path.
    collection_path: String,
    /// Runtime variables in catalog order.
    variables: Vec<RuntimeVariable>,
    /// Extra runner arguments.
    extra_args: Vec<String>,
}

impl Invocation {
    /// Builds the newman invocation for the resolved settings.
    #[must_use]
    pub fn newman(settings: &RunnerSettings, options: &NewmanOptions) -> Self {
        let variables = settings
            .iter()
            .filter_map(|(setting, resolved)| {
                setting.runtime_variable().map(|name| RuntimeVariable {
                    setting,
                    name,
                    value: resolved.value.clone(),
                })
            })
            .collect();
        Self {
            program: options.binary.clone(),
            collection_path: settings.collection_path.value.clone(),
            variables,
            extra_args: options.extra_args.clone(),
        }
    }

    /// Runner binary name or path.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Collection path passed positionally.
    #[must_use]
    pub fn collection_path(&self) -> &str {
        &self.collection_path
    }

    /// Runtime variables in catalog order.
    #[must_use]
    pub fn variables(&self) -> &[RuntimeVariable] {
        &self.variables
    }

    /// Full argument vector (without the program), ending with `--bail`.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        self.build_args(RuntimeVariable::assignment)
    }

    /// Argument vector with secret values masked.
    #[must_use]
    pub fn redacted_args(&self) -> Vec<String> {
        self.build_args(RuntimeVariable::redacted_assignment)
    }

    /// Redacted command line for display, quoted like a POSIX shell would.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.redacted_args())
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serializable, redacted view of this invocation.
    #[must_use]
    pub fn plan(&self) -> InvocationPlan {
        let args = self.redacted_args();
        InvocationPlan {
            program: self.program.clone(),
            collection_path: self.collection_path.clone(),
            runtime_variables: self
                .variables
                .iter()
                .map(|variable| {
                    let value = if variable.setting.is_secret() {
                        REDACTED.to_string()
                    } else {
                        variable.value.clone()
                    };
                    (variable.name.to_string(), value)
                })
                .collect(),
            extra_args: self.extra_args.clone(),
            fail_fast: args.last().is_some_and(|arg| arg == FAIL_FAST_FLAG),
            args,
        }
    }

    /// Assembles arguments using `render` for each runtime variable.
    fn build_args(&self, render: impl Fn(&RuntimeVariable) -> String) -> Vec<String> {
        let mut args = Vec::with_capacity(3 + self.variables.len() * 2 + self.extra_args.len());
        args.push(RUN_SUBCOMMAND.to_string());
        args.push(self.collection_path.clone());
        for variable in &self.variables {
            args.push(ENV_VAR_FLAG.to_string());
            args.push(render(variable));
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(FAIL_FAST_FLAG.to_string());
        args
    }
}

/// Redacted, serializable description of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationPlan {
    /// Runner binary name or path.
    pub program: String,
    /// Collection path passed positionally.
    pub collection_path: String,
    /// Runtime variables by name, secrets masked.
    pub runtime_variables: BTreeMap<String, String>,
    /// Extra runner arguments.
    pub extra_args: Vec<String>,
    /// True when the run stops at the first failure.
    pub fail_fast: bool,
    /// Full redacted argument vector.
    pub args: Vec<String>,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Quotes `arg` for display when it contains shell metacharacters.
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg.chars().all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));
    if plain {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test-only assertions are permitted."
    )]

    use std::collections::BTreeMap;

    use apisec_config::RunnerSettings;
    use apisec_config::SettingsSection;

    use super::FAIL_FAST_FLAG;
    use super::Invocation;
    use super::NewmanOptions;
    use super::shell_quote;

    fn defaults() -> RunnerSettings {
        RunnerSettings::resolve(&BTreeMap::new(), &SettingsSection::default())
    }

    #[test]
    fn default_invocation_matches_runner_contract() {
        let invocation = Invocation::newman(&defaults(), &NewmanOptions::default());
        assert_eq!(invocation.program(), "newman");
        assert_eq!(
            invocation.args(),
            vec![
                "run",
                "tests/postman/collection.json",
                "--env-var",
                "authBaseUrl=http://localhost:8001",
                "--env-var",
                "accountBaseUrl=http://localhost:8002",
                "--env-var",
                "transactionBaseUrl=http://localhost:8003",
                "--env-var",
                "clientId=web-portal",
                "--env-var",
                "clientSecret=change-me",
                "--env-var",
                "username=analyst@example.com",
                "--env-var",
                "password=P@ssw0rd!",
                "--bail",
            ]
        );
    }

    #[test]
    fn extra_args_precede_fail_fast_flag() {
        let options = NewmanOptions::default()
            .with_extra_args(["--reporters".to_string(), "cli,junit".to_string()]);
        let args = Invocation::newman(&defaults(), &options).args();
        let len = args.len();
        assert_eq!(&args[len - 3..], ["--reporters", "cli,junit", FAIL_FAST_FLAG]);
    }

    #[test]
    fn redacted_args_mask_only_secrets() {
        let invocation = Invocation::newman(&defaults(), &NewmanOptions::default());
        let redacted = invocation.redacted_args();
        assert!(redacted.contains(&"clientSecret=********".to_string()));
        assert!(redacted.contains(&"password=********".to_string()));
        assert!(redacted.contains(&"clientId=web-portal".to_string()));
        assert!(!redacted.iter().any(|arg| arg.contains("change-me")));
        assert!(!invocation.display_command().contains("P@ssw0rd!"));
    }

    #[test]
    fn blank_binary_override_is_ignored() {
        let options = NewmanOptions::default().with_binary_override(Some("  ".to_string()));
        assert_eq!(options.binary, "newman");
        let options = NewmanOptions::default().with_binary_override(Some("/bin/fake".to_string()));
        assert_eq!(options.binary, "/bin/fake");
    }

    #[test]
    fn plan_reports_fail_fast_and_masks_secrets() {
        let plan = Invocation::newman(&defaults(), &NewmanOptions::default()).plan();
        assert!(plan.fail_fast);
        assert_eq!(plan.runtime_variables.len(), 7);
        assert_eq!(plan.runtime_variables["password"], "********");
        assert_eq!(plan.runtime_variables["authBaseUrl"], "http://localhost:8001");
    }

    #[test]
    fn shell_quote_wraps_metacharacters() {
        assert_eq!(shell_quote("password=P@ss"), "password=P@ss");
        assert_eq!(shell_quote("has space"), "'has space'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
