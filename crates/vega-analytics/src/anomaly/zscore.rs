//! Z-score detection against a channel baseline.

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineStats;
use crate::invariants::{ANOMALY_SIGMA, SIGMA_CONFIDENCE_PERCENT};

/// Which side of the baseline a reading falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Deviation {
    Above,
    Below,
    Normal,
}

impl std::fmt::Display for Deviation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Above => write!(f, "above"),
            Self::Below => write!(f, "below"),
            Self::Normal => write!(f, "normal"),
        }
    }
}

/// Outcome of comparing one reading to its baseline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZScoreResult {
    /// Signed standardized deviation.
    pub z_score: f64,
    /// floor(|z|), clamped to 4.
    pub sigma_level: u8,
    /// Two-sided normal confidence for `sigma_level` (percent).
    pub confidence_percent: f64,
    /// |z| ≥ 2.
    pub is_anomaly: bool,
    pub direction: Deviation,
}

impl ZScoreResult {
    /// Returned whenever the baseline is not yet valid.
    pub const NORMAL: ZScoreResult = ZScoreResult {
        z_score: 0.0,
        sigma_level: 0,
        confidence_percent: 0.0,
        is_anomaly: false,
        direction: Deviation::Normal,
    };

    /// Build a result from a raw z value.
    pub fn from_z(z: f64) -> Self {
        if !z.is_finite() {
            return Self::NORMAL;
        }
        let abs = z.abs();
        let sigma_level = abs.floor().min(4.0) as u8;
        let confidence_percent = match sigma_level {
            0 => 0.0,
            n => SIGMA_CONFIDENCE_PERCENT[(n as usize - 1).min(3)],
        };
        let direction = if z > 1.0 {
            Deviation::Above
        } else if z < -1.0 {
            Deviation::Below
        } else {
            Deviation::Normal
        };
        Self {
            z_score: z,
            sigma_level,
            confidence_percent,
            is_anomaly: abs >= ANOMALY_SIGMA,
            direction,
        }
    }
}

/// Z-score of `value` against `baseline`, or [`ZScoreResult::NORMAL`] if the
/// baseline cannot be judged against yet.
pub fn z_score(value: f64, baseline: &BaselineStats) -> ZScoreResult {
    match baseline.z_score(value) {
        Some(z) => ZScoreResult::from_z(z),
        None => ZScoreResult::NORMAL,
    }
}
