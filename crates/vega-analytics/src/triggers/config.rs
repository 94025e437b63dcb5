//! Alert policy.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

/// Thresholds and enable flags for turning snapshots into triggers.
///
/// A pure value: build one per evaluation or keep one around, the evaluator
/// holds no state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalAlertConfig {
    /// Master switch: when off, no trigger fires.
    pub enabled: bool,

    pub z_score_enabled: bool,
    /// |z| required for a z-score trigger.
    pub z_score_sigma: f64,

    pub rate_of_change_enabled: bool,
    /// |percent per second| required for a rate-of-change trigger.
    pub rate_percent_per_second: f64,

    pub cusum_enabled: bool,

    pub forecast_enabled: bool,
    /// Dose rate (μSv/h) the earliest forecast must not exceed.
    pub forecast_threshold: f64,

    pub predictive_enabled: bool,
    /// User alert levels (μSv/h) watched for predicted crossings.
    pub alert_thresholds: Vec<f64>,
    /// Warn when a crossing is predicted within this many seconds.
    pub warning_window_secs: f64,

    pub changepoint_enabled: bool,
    pub location_enabled: bool,
}

impl Default for StatisticalAlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            z_score_enabled: true,
            z_score_sigma: 3.0,
            rate_of_change_enabled: true,
            rate_percent_per_second: 10.0,
            cusum_enabled: true,
            forecast_enabled: true,
            forecast_threshold: 0.5,
            predictive_enabled: true,
            alert_thresholds: vec![0.5, 1.0, 2.5, 10.0],
            warning_window_secs: 60.0,
            changepoint_enabled: false,
            location_enabled: false,
        }
    }
}

impl StatisticalAlertConfig {
    /// Everything off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        let checks = [
            ("alerts.z_score_sigma", self.z_score_sigma),
            ("alerts.rate_percent_per_second", self.rate_percent_per_second),
            ("alerts.forecast_threshold", self.forecast_threshold),
            ("alerts.warning_window_secs", self.warning_window_secs),
        ];
        for (field, value) in checks {
            if !(value > 0.0) || !value.is_finite() {
                return Err(AnalyticsError::config(
                    field,
                    format!("{} must be positive", value),
                ));
            }
        }
        if let Some(bad) = self
            .alert_thresholds
            .iter()
            .find(|t| !(**t > 0.0) || !t.is_finite())
        {
            return Err(AnalyticsError::config(
                "alerts.alert_thresholds",
                format!("{} is not a usable dose rate", bad),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = StatisticalAlertConfig::default();
        assert!(cfg.enabled);
        assert!(cfg.validate().is_ok());
        assert!(!cfg.changepoint_enabled);
    }

    #[test]
    fn rejects_bad_thresholds() {
        let cfg = StatisticalAlertConfig {
            alert_thresholds: vec![0.5, -1.0],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = StatisticalAlertConfig {
            warning_window_secs: 0.0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("warning_window_secs"));
    }

    #[test]
    fn partial_document() {
        let cfg: StatisticalAlertConfig =
            serde_json::from_str(r#"{"alert_thresholds": [0.3], "location_enabled": true}"#)
                .unwrap();
        assert_eq!(cfg.alert_thresholds, vec![0.3]);
        assert!(cfg.location_enabled);
        assert_eq!(cfg.z_score_sigma, 3.0);
    }
}
