//! Vega CLI - Command-line interface for Vega radiation analytics
//!
//! This CLI provides operators and developers with a terminal interface to:
//! - Replay recorded detector streams through the analytics engine
//! - Bin positions into the hex cells used for location baselines
//! - Inspect the effective engine, alert and grid configuration

use std::ffi::OsString;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{analyze, cell};
pub use config::VegaConfig;
pub use error::{CliError, CliResult};
pub use output::OutputFormat;

/// Vega CLI application
#[derive(Parser)]
#[command(name = "vega")]
#[command(about = "Vega - streaming radiation analytics CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML with [engine], [alerts] and [grid])
    #[arg(short, long, global = true, env = "VEGA_CONFIG")]
    config: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "VEGA_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "VEGA_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines sample stream and report triggers
    Analyze(analyze::AnalyzeArgs),

    /// Show the hex cell containing a position
    Cell(cell::CellArgs),

    /// Print the effective configuration
    Config,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(&cli.log_level, cli.log_json);

    let config = VegaConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => analyze::execute(args, &config, cli.output),
        Commands::Cell(args) => cell::execute(args, &config, cli.output),
        Commands::Config => commands::config::execute(&config, cli.output),
    }
}

/// Install the global subscriber; logs go to stderr so stdout stays parseable.
fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // A subscriber may already be installed when running in-process.
    let _ = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "vega",
            "--output",
            "json",
            "analyze",
            "--snapshots",
            "--daily-limit",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Analyze(args) => {
                assert!(args.snapshots);
                assert_eq!(args.daily_limit, 5.0);
                assert!(args.input.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_cell_accepts_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["vega", "cell", "--lat", "-33.86", "--lng", "151.2"]).unwrap();
        assert!(matches!(cli.command, Commands::Cell(ref a) if a.lat == -33.86));
    }
}
