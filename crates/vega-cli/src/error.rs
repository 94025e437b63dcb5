//! CLI error types

use thiserror::Error;
use vega_analytics::AnalyticsError;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encoding error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Invalid input on line {line}: {detail}")]
    InvalidInput { line: usize, detail: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
