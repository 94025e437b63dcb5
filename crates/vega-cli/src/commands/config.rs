//! Effective configuration dump

use crate::config::VegaConfig;
use crate::error::CliResult;
use crate::output::OutputFormat;

/// Execute `vega config`
pub fn execute(config: &VegaConfig, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Table => print!("{}", config.to_toml()?),
    }
    Ok(())
}
