//! Moving-average crossover detection.
//!
//! Compares a short and a long simple moving average over the channel's
//! short rolling buffer. A sign change of `short − long` between two
//! consecutive readings is a crossover:
//!
//! - **Golden**: short crosses above long (rising regime)
//! - **Death**: short crosses below long (falling regime)
//!
//! The most recent crossover keeps being reported for a hold period so that
//! consumers polling less often than the sensor still observe it.

use serde::{Deserialize, Serialize};

use crate::buffer::{RollingBuffer, Sample};
use crate::config::WindowConfig;

/// Kind of moving-average crossover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossoverKind {
    Golden,
    Death,
    None,
}

impl std::fmt::Display for CrossoverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Golden => write!(f, "golden-cross"),
            Self::Death => write!(f, "death-cross"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Moving averages and the most recent crossover still within its hold period.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossoverResult {
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub crossover: CrossoverKind,
    /// Whether the crossover happened on this reading.
    pub just_crossed: bool,
    pub seconds_since_crossover: Option<f64>,
}

impl CrossoverResult {
    /// Not enough history for the long average.
    pub const NONE: CrossoverResult = CrossoverResult {
        short_ma: None,
        long_ma: None,
        crossover: CrossoverKind::None,
        just_crossed: false,
        seconds_since_crossover: None,
    };
}

/// Per-channel crossover state.
#[derive(Clone, Debug)]
pub struct CrossoverDetector {
    short_window: usize,
    long_window: usize,
    hold_ms: i64,
    previous_diff: Option<f64>,
    last_crossover: Option<(CrossoverKind, i64)>,
}

impl CrossoverDetector {
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            short_window: config.ma_short,
            long_window: config.ma_long,
            hold_ms: (config.crossover_hold_secs as i64).saturating_mul(1000),
            previous_diff: None,
            last_crossover: None,
        }
    }

    /// Evaluate the buffer after the reading at `now_ms` has been pushed.
    pub fn update(&mut self, history: &RollingBuffer<Sample>, now_ms: i64) -> CrossoverResult {
        let (Some(short), Some(long)) = (
            history.mean_of_last(self.short_window),
            history.mean_of_last(self.long_window),
        ) else {
            return CrossoverResult::NONE;
        };

        let diff = short - long;
        let crossed = match self.previous_diff.replace(diff) {
            Some(prev) if prev <= 0.0 && diff > 0.0 => Some(CrossoverKind::Golden),
            Some(prev) if prev >= 0.0 && diff < 0.0 => Some(CrossoverKind::Death),
            _ => None,
        };
        if let Some(kind) = crossed {
            self.last_crossover = Some((kind, now_ms));
        }

        let mut result = CrossoverResult {
            short_ma: Some(short),
            long_ma: Some(long),
            just_crossed: crossed.is_some(),
            ..CrossoverResult::NONE
        };
        if let Some((kind, at)) = self.last_crossover {
            let elapsed = now_ms.saturating_sub(at);
            if elapsed < 0 {
                self.last_crossover = None;
            } else if elapsed <= self.hold_ms {
                result.crossover = kind;
                result.seconds_since_crossover = Some(elapsed as f64 / 1000.0);
            }
        }
        result
    }

    pub fn reset(&mut self) {
        self.previous_diff = None;
        self.last_crossover = None;
    }
}
