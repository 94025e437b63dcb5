//! Source proximity heuristic.
//!
//! Assumes a point source and inverse-square falloff while the operator
//! walks at about 1 m/s. With intensity I above background and its rate of
//! change dI/dt, the distance is roughly `2·v·I / (dI/dt)`.
//!
//! These are field heuristics: the confidence tier says how much of the
//! evidence agreed, not a statistical interval.

use serde::{Deserialize, Serialize};

use crate::buffer::{RollingBuffer, Sample};
use crate::invariants::non_negative;

/// Assumed walking speed, m/s.
const WALK_SPEED_M_S: f64 = 1.0;

/// Assumed closest approach to the source, m.
const CLOSEST_APPROACH_M: f64 = 0.5;

const MIN_DISTANCE_M: f64 = 0.1;
const MAX_DISTANCE_M: f64 = 100.0;
const MAX_PEAK_MULTIPLIER: f64 = 100.0;

/// Readings needed for three deltas.
pub(crate) const MIN_READINGS: usize = 4;

/// Heuristic confidence tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProximityConfidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for ProximityConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Estimated proximity of a radiation source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceProximityResult {
    /// Whether there is enough history to say anything.
    pub available: bool,
    /// At least two of the last three deltas were positive.
    pub is_approaching: bool,
    pub current_value: f64,
    pub background: f64,
    /// Rate over the last three deltas, units per second.
    pub rate_of_change: f64,
    pub estimated_distance_m: Option<f64>,
    /// Reading expected at the closest approach.
    pub estimated_peak: Option<f64>,
    pub peak_multiplier: Option<f64>,
    pub confidence: ProximityConfidence,
    pub readings_used: usize,
}

impl SourceProximityResult {
    /// Fewer than four readings.
    pub const UNKNOWN: SourceProximityResult = SourceProximityResult {
        available: false,
        is_approaching: false,
        current_value: 0.0,
        background: 0.0,
        rate_of_change: 0.0,
        estimated_distance_m: None,
        estimated_peak: None,
        peak_multiplier: None,
        confidence: ProximityConfidence::Low,
        readings_used: 0,
    };
}

/// Estimate source proximity from the recent dose `history` relative to
/// `background` (μSv/h).
pub fn estimate_source_proximity(
    history: &RollingBuffer<Sample>,
    background: f64,
) -> SourceProximityResult {
    let readings = history.to_vec();
    let n = readings.len();
    if n < MIN_READINGS {
        return SourceProximityResult::UNKNOWN;
    }

    let background = non_negative(background);
    let window = &readings[n - MIN_READINGS..];
    let rising = window
        .windows(2)
        .filter(|w| w[1].value > w[0].value)
        .count();
    let is_approaching = rising >= 2;

    let first = window[0];
    let current = window[MIN_READINGS - 1];
    let elapsed = current.seconds_since(&first);
    // Nominal 1 Hz cadence when timestamps give no usable span.
    let span = if elapsed > 0.0 {
        elapsed
    } else {
        (MIN_READINGS - 1) as f64
    };
    let rate_of_change = (current.value - first.value) / span;
    let excess = current.value - background;

    let mut result = SourceProximityResult {
        available: true,
        is_approaching,
        current_value: current.value,
        background,
        rate_of_change,
        confidence: confidence_tier(n, rising, is_approaching),
        readings_used: n,
        ..SourceProximityResult::UNKNOWN
    };

    if is_approaching && rate_of_change > 0.0 && excess > 0.0 {
        let distance =
            (2.0 * WALK_SPEED_M_S * excess / rate_of_change).clamp(MIN_DISTANCE_M, MAX_DISTANCE_M);
        let multiplier = (distance / CLOSEST_APPROACH_M)
            .powi(2)
            .min(MAX_PEAK_MULTIPLIER);
        result.estimated_distance_m = Some(distance);
        result.peak_multiplier = Some(multiplier);
        result.estimated_peak = Some(background + excess * multiplier);
    }
    result
}

fn confidence_tier(readings: usize, rising: usize, approaching: bool) -> ProximityConfidence {
    if readings >= 8 && rising == MIN_READINGS - 1 {
        ProximityConfidence::High
    } else if readings >= 5 && approaching {
        ProximityConfidence::Medium
    } else {
        ProximityConfidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(values: &[f64]) -> RollingBuffer<Sample> {
        let mut buf = RollingBuffer::new(10);
        for (i, v) in values.iter().enumerate() {
            buf.push(Sample::new(*v, i as i64 * 1000));
        }
        buf
    }

    #[test]
    fn unknown_below_four_readings() {
        let r = estimate_source_proximity(&history(&[0.1, 0.2, 0.3]), 0.1);
        assert_eq!(r, SourceProximityResult::UNKNOWN);
    }

    #[test]
    fn approaching_source_distance() {
        let r = estimate_source_proximity(&history(&[0.2, 0.3, 0.5, 0.9]), 0.1);
        assert!(r.is_approaching);
        assert!((r.rate_of_change - 0.7 / 3.0).abs() < 1e-12);
        // 2 · 1 · 0.8 / (0.7/3) ≈ 6.857 m
        let d = r.estimated_distance_m.unwrap();
        assert!((d - 2.0 * 0.8 / (0.7 / 3.0)).abs() < 1e-9);
        // (6.857 / 0.5)² > 100: capped.
        assert_eq!(r.peak_multiplier, Some(100.0));
        assert!((r.estimated_peak.unwrap() - (0.1 + 0.8 * 100.0)).abs() < 1e-9);
        assert_eq!(r.confidence, ProximityConfidence::Low);
    }

    #[test]
    fn distance_is_clamped() {
        // Tiny rate, large excess: far away, clamped to 100 m.
        let r = estimate_source_proximity(&history(&[5.0, 5.001, 5.002, 5.003]), 0.1);
        assert_eq!(r.estimated_distance_m, Some(100.0));
    }

    #[test]
    fn confidence_tiers() {
        let steady_rise: Vec<f64> = (0..8).map(|i| 0.1 + 0.05 * i as f64).collect();
        let r = estimate_source_proximity(&history(&steady_rise), 0.1);
        assert_eq!(r.confidence, ProximityConfidence::High);

        let r = estimate_source_proximity(&history(&[0.1, 0.1, 0.2, 0.3, 0.25, 0.4]), 0.1);
        assert!(r.is_approaching);
        assert_eq!(r.confidence, ProximityConfidence::Medium);
    }

    #[test]
    fn flat_readings_are_not_approaching() {
        let r = estimate_source_proximity(&history(&[0.1; 6]), 0.1);
        assert!(r.available);
        assert!(!r.is_approaching);
        assert_eq!(r.estimated_distance_m, None);
        assert_eq!(r.confidence, ProximityConfidence::Low);
    }
}
