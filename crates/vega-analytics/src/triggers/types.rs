//! Trigger output types.

use serde::{Deserialize, Serialize};

use crate::baseline::Channel;

/// Which rule produced a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    ZScoreAnomaly,
    RateOfChange,
    CusumChange,
    ForecastThreshold,
    PredictiveCrossing,
    Changepoint,
    LocationAnomaly,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZScoreAnomaly => write!(f, "Z_SCORE_ANOMALY"),
            Self::RateOfChange => write!(f, "RATE_OF_CHANGE"),
            Self::CusumChange => write!(f, "CUSUM_CHANGE"),
            Self::ForecastThreshold => write!(f, "FORECAST_THRESHOLD"),
            Self::PredictiveCrossing => write!(f, "PREDICTIVE_CROSSING"),
            Self::Changepoint => write!(f, "CHANGEPOINT"),
            Self::LocationAnomaly => write!(f, "LOCATION_ANOMALY"),
        }
    }
}

/// Trigger severity, ordered from least to most urgent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerSeverity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for TriggerSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A fire-able alert. Never stored by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatisticalTrigger {
    pub trigger_type: TriggerType,
    pub channel: Channel,
    pub severity: TriggerSeverity,
    pub message: String,
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    pub detected_value: f64,
    pub threshold_value: f64,
    pub timestamp_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_string(&TriggerType::ZScoreAnomaly).unwrap(),
            "\"Z_SCORE_ANOMALY\""
        );
        assert_eq!(
            serde_json::to_string(&TriggerType::PredictiveCrossing).unwrap(),
            "\"PREDICTIVE_CROSSING\""
        );
        assert_eq!(TriggerType::CusumChange.to_string(), "CUSUM_CHANGE");
    }

    #[test]
    fn severity_ordering() {
        assert!(TriggerSeverity::Critical > TriggerSeverity::Warning);
        assert!(TriggerSeverity::Warning > TriggerSeverity::Info);
    }
}
