//! CLI configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use vega_analytics::{EngineConfig, HexGrid, StatisticalAlertConfig};

use crate::error::CliResult;

/// Everything the CLI can tune, loaded from one TOML file.
///
/// ```toml
/// [engine.cusum]
/// decision_sigma = 5.0
///
/// [alerts]
/// z_score_sigma = 2.5
///
/// [grid]
/// origin_lat = 47.37
/// origin_lng = 8.54
/// cell_size_m = 25.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegaConfig {
    pub engine: EngineConfig,
    pub alerts: StatisticalAlertConfig,
    pub grid: HexGrid,
}

impl VegaConfig {
    /// Load configuration from file.
    ///
    /// No path, or a path that does not exist, yields the defaults.
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let path = Path::new(path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> CliResult<Self> {
        let config: VegaConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        self.engine.validate()?;
        self.grid.validate()?;
        self.alerts.validate()?;
        Ok(())
    }

    pub fn to_toml(&self) -> CliResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
