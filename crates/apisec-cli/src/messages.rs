// crates/apisec-cli/src/messages.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Static message catalog and placeholder rendering for the CLI.
// Purpose: Centralize user-facing strings so output stays consistent.
// Dependencies: none
// ============================================================================

//! ## Overview
//! User-facing strings live in one static table and are rendered through the
//! [`t!`](crate::t) macro. Unknown keys render as the key itself.

// ============================================================================
// SECTION: Types
// ============================================================================

/// One named placeholder value.
pub struct MessageArg {
    /// Placeholder name without braces.
    pub key: &'static str,
    /// Substituted text.
    pub value: String,
}

impl MessageArg {
    /// Pairs a placeholder name with its text.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries.
const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "apisec-runner {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid: {path}"),
    ("config.validate.none", "No config file selected; environment and defaults apply."),
    ("config.show.file", "config file: {path}"),
    ("config.show.file_none", "config file: (none)"),
    ("config.show.setting", "{env}={value} ({source})"),
    ("config.show.binary", "newman binary: {binary}"),
    ("config.show.extra_args", "newman extra args: {args}"),
    ("config.show.extra_args_none", "newman extra args: (none)"),
    ("output.serialize_failed", "Failed to serialize {kind}: {error}"),
    ("output.kind.plan", "invocation plan"),
    ("output.kind.settings", "resolved settings"),
    ("audit.open_failed", "Failed to open audit log at {path}: {error}"),
    ("run.invocation_failed", "{error}"),
    ("run.failed", "Collection run failed with exit code {code}."),
];

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Looks up `key` and fills in every `{name}` placeholder from `args`.
#[must_use]
pub fn render(key: &str, args: &[MessageArg]) -> String {
    let template =
        CATALOG_ITEMS.iter().find(|(name, _)| *name == key).map_or(key, |(_, text)| *text);
    let mut message = template.to_string();
    for arg in args {
        message = message.replace(&format!("{{{}}}", arg.key), &arg.value);
    }
    message
}

/// Renders a catalog message: `t!("run.failed", code = 3)`.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {
        $crate::messages::render(
            $key,
            &[$($crate::messages::MessageArg::new(stringify!($name), $value.to_string())),*],
        )
    };
}
