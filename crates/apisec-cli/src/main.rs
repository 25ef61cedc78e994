// crates/apisec-cli/src/main.rs
// ============================================================================
// Module: apisec-runner CLI Entry Point
// Description: Command dispatcher for compliance collection runs.
// Purpose: Run the Postman collection once, fail-fast, with exit passthrough.
// Dependencies: apisec-cli, apisec-config, apisec-runner, clap, serde_json,
//               thiserror, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! `apisec-runner` resolves the collection path, service base URLs, and OAuth
//! credentials from the environment, then runs the collection through newman
//! exactly once with `--bail`. Invoked without a subcommand it behaves like
//! `apisec-runner run`, and its exit code is the collection runner's.
//!
//! Security posture: the client secret and password are masked in every
//! rendered plan, log line, and audit event.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::IsTerminal;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use apisec_cli::launch::Launch;
use apisec_cli::launch::LaunchRequest;
use apisec_cli::launch::audit_sink;
use apisec_cli::launch::prepare;
use apisec_cli::t;
use apisec_config::ProcessEnv;
use apisec_config::RunnerConfig;
use apisec_config::Setting;
use apisec_runner::ProcessRunner;
use apisec_runner::RunStatus;
use apisec_runner::execute;
use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;
use tracing::Level;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "apisec-runner",
    about = "Run the API security compliance collection against the fintech services",
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Emit debug logs to stderr.
    #[arg(long, short = 'v', action = ArgAction::SetTrue, global = true)]
    verbose: bool,
    /// Selected subcommand; defaults to `run`.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the collection once with fail-fast enabled.
    Run(RunCommand),
    /// Print the invocation that `run` would execute, secrets masked.
    Plan(PlanCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Inputs shared by every command that resolves settings.
#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Optional config file path (defaults to `APISEC_CONFIG` when set).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Collection runner binary (overrides `NEWMAN_BIN` and the config file).
    #[arg(long = "newman-bin", value_name = "PATH")]
    newman_bin: Option<String>,
}

/// Arguments for `run`.
#[derive(Args, Debug, Default)]
struct RunCommand {
    /// Settings sources.
    #[command(flatten)]
    source: SourceArgs,
    /// Append a JSON-lines audit event for this run to PATH.
    #[arg(long, value_name = "PATH")]
    audit_log: Option<PathBuf>,
    /// Extra runner arguments, placed before `--bail`.
    #[arg(last = true, value_name = "NEWMAN_ARGS")]
    extra_args: Vec<String>,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
struct PlanCommand {
    /// Settings sources.
    #[command(flatten)]
    source: SourceArgs,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Extra runner arguments, placed before `--bail`.
    #[arg(last = true, value_name = "NEWMAN_ARGS")]
    extra_args: Vec<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Show resolved settings and where each value came from.
    Show(ConfigShowCommand),
    /// Validate a config file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config show`.
#[derive(Args, Debug)]
struct ConfigShowCommand {
    /// Settings sources.
    #[command(flatten)]
    source: SourceArgs,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to `APISEC_CONFIG` when set).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Output formats for plans and settings.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// One resolved setting as rendered by `config show`.
#[derive(Debug, Serialize)]
struct SettingView {
    /// Environment variable name.
    env_var: &'static str,
    /// Config file key.
    config_key: &'static str,
    /// Runtime variable name, if any.
    runtime_variable: Option<&'static str>,
    /// Value, masked for secrets.
    value: String,
    /// Provenance label.
    source: &'static str,
    /// True when the value is masked.
    secret: bool,
}

/// Full `config show` JSON document.
#[derive(Debug, Serialize)]
struct SettingsView {
    /// Config file the values were layered from.
    config_file: Option<String>,
    /// Resolved settings in catalog order.
    settings: Vec<SettingView>,
    /// Effective runner binary.
    newman_binary: String,
    /// Effective extra runner arguments.
    newman_extra_args: Vec<String>,
}

impl SettingsView {
    /// Builds the view from a prepared launch.
    fn from_launch(launch: &Launch) -> Self {
        let settings = launch
            .settings
            .iter()
            .map(|(setting, resolved)| SettingView {
                env_var: setting.env_var(),
                config_key: setting.config_key(),
                runtime_variable: setting.runtime_variable(),
                value: resolved.display_value(setting.is_secret()).to_string(),
                source: resolved.source.as_str(),
                secret: setting.is_secret(),
            })
            .collect();
        Self {
            config_file: launch
                .config
                .source_path
                .as_ref()
                .map(|path| path.display().to_string()),
            settings,
            newman_binary: launch.options.binary.clone(),
            newman_extra_args: launch.options.extra_args.clone(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a rendered message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        None => command_run(RunCommand::default()),
        Some(Commands::Run(command)) => command_run(command),
        Some(Commands::Plan(command)) => command_plan(command),
        Some(Commands::Config {
            command,
        }) => command_config(command),
    }
}

/// Installs the stderr log subscriber.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let launch = prepare_launch(command.source, command.extra_args)?;
    let sink = audit_sink(command.audit_log.as_deref(), &launch.config.audit)
        .map_err(|err| CliError::new(err.to_string()))?;
    match execute(&launch.invocation, &ProcessRunner, sink.as_ref()) {
        Ok(outcome) => {
            if outcome.status == RunStatus::Failed {
                tracing::info!(
                    exit_code = outcome.exit_code,
                    "{}",
                    t!("run.failed", code = outcome.exit_code)
                );
            }
            Ok(ExitCode::from(outcome.exit_code))
        }
        Err(err) => {
            write_stderr_line(&t!("run.invocation_failed", error = err))
                .map_err(|io_err| CliError::new(output_error("stderr", &io_err)))?;
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

// ============================================================================
// SECTION: Plan Command
// ============================================================================

/// Executes the `plan` command.
fn command_plan(command: PlanCommand) -> CliResult<ExitCode> {
    let launch = prepare_launch(command.source, command.extra_args)?;
    match command.format {
        OutputFormat::Text => write_stdout_line(&launch.invocation.display_command())
            .map_err(|err| CliError::new(output_error("stdout", &err)))?,
        OutputFormat::Json => write_json(&launch.invocation.plan(), &t!("output.kind.plan"))?,
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Show(command) => command_config_show(command),
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes `config show`.
fn command_config_show(command: ConfigShowCommand) -> CliResult<ExitCode> {
    let launch = prepare_launch(command.source, Vec::new())?;
    let view = SettingsView::from_launch(&launch);
    match command.format {
        OutputFormat::Json => write_json(&view, &t!("output.kind.settings"))?,
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str(&view.config_file.as_ref().map_or_else(
                || t!("config.show.file_none"),
                |path| t!("config.show.file", path = path),
            ));
            output.push('\n');
            for entry in &view.settings {
                output.push_str(&t!(
                    "config.show.setting",
                    env = entry.env_var,
                    value = entry.value,
                    source = entry.source
                ));
                output.push('\n');
            }
            output.push_str(&t!("config.show.binary", binary = view.newman_binary));
            output.push('\n');
            if view.newman_extra_args.is_empty() {
                output.push_str(&t!("config.show.extra_args_none"));
            } else {
                output.push_str(&t!("config.show.extra_args", args = view.newman_extra_args.join(" ")));
            }
            output.push('\n');
            write_stdout_bytes(output.as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = RunnerConfig::load(command.config.as_deref(), &ProcessEnv)
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let message = config.source_path.as_ref().map_or_else(
        || t!("config.validate.none"),
        |path| t!("config.validate.ok", path = path.display()),
    );
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Launch Helpers
// ============================================================================

/// Prepares a launch from CLI sources and the process environment.
fn prepare_launch(source: SourceArgs, extra_args: Vec<String>) -> CliResult<Launch> {
    let request = LaunchRequest {
        config_path: source.config,
        newman_bin: source.newman_bin,
        extra_args,
    };
    let launch = prepare(request, &ProcessEnv).map_err(|err| CliError::new(err.to_string()))?;
    let collection = launch.settings.get(Setting::CollectionPath);
    tracing::debug!(
        path = %collection.value,
        source = collection.source.as_str(),
        "resolved collection"
    );
    Ok(launch)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes pretty JSON followed by a newline to stdout.
fn write_json<T: Serialize>(value: &T, kind: &str) -> CliResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| CliError::new(t!("output.serialize_failed", kind = kind, error = err)))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
