//! Running integral of dose rate over the session.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::invariants::MS_PER_HOUR;

/// Accumulated dose and projection against a daily limit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CumulativeDoseResult {
    /// Integrated dose, μSv.
    pub total_usv: f64,
    /// Most recent dose rate, μSv/h.
    pub current_rate: f64,
    /// current_rate × 24.
    pub projected_daily: f64,
    pub daily_limit: f64,
    pub percent_of_limit: f64,
    /// max(0, limit − total).
    pub remaining: f64,
    /// remaining / current_rate; +∞ when the rate is zero or the limit is reached.
    pub hours_to_limit: f64,
    pub limit_exceeded: bool,
    /// Hours between the first and latest integrated readings.
    pub session_hours: f64,
}

/// Rectangle-rule integrator: each reading contributes its rate over the
/// time elapsed since the previous reading.
#[derive(Clone, Debug, Default)]
pub struct CumulativeDoseTracker {
    total_usv: f64,
    current_rate: f64,
    session_start_ms: Option<i64>,
    last_ms: Option<i64>,
}

impl CumulativeDoseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate one reading. The first call only seeds the clock; a
    /// non-positive Δt contributes nothing.
    pub fn add(&mut self, dose_rate: f64, timestamp_ms: i64) {
        if let Some(last) = self.last_ms {
            let hours = timestamp_ms.saturating_sub(last) as f64 / MS_PER_HOUR;
            if hours > 0.0 {
                self.total_usv += dose_rate * hours;
            }
        } else {
            self.session_start_ms = Some(timestamp_ms);
        }
        self.last_ms = Some(timestamp_ms);
        self.current_rate = dose_rate;
    }

    pub fn total_usv(&self) -> f64 {
        self.total_usv
    }

    /// Summarize against `daily_limit` (μSv).
    pub fn result(&self, daily_limit: f64) -> AnalyticsResult<CumulativeDoseResult> {
        if !(daily_limit > 0.0) || !daily_limit.is_finite() {
            return Err(AnalyticsError::InvalidArgument(format!(
                "daily dose limit must be positive, got {}",
                daily_limit
            )));
        }
        let remaining = (daily_limit - self.total_usv).max(0.0);
        let limit_exceeded = self.total_usv >= daily_limit;
        let hours_to_limit = if self.current_rate <= 0.0 || limit_exceeded {
            f64::INFINITY
        } else {
            remaining / self.current_rate
        };
        let session_hours = match (self.session_start_ms, self.last_ms) {
            (Some(start), Some(last)) => (last.saturating_sub(start) as f64 / MS_PER_HOUR).max(0.0),
            _ => 0.0,
        };

        Ok(CumulativeDoseResult {
            total_usv: self.total_usv,
            current_rate: self.current_rate,
            projected_daily: self.current_rate * 24.0,
            daily_limit,
            percent_of_limit: self.total_usv / daily_limit * 100.0,
            remaining,
            hours_to_limit,
            limit_exceeded,
            session_hours,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reading_only_seeds() {
        let mut t = CumulativeDoseTracker::new();
        t.add(10.0, 0);
        assert_eq!(t.total_usv(), 0.0);
        let r = t.result(100.0).unwrap();
        assert_eq!(r.current_rate, 10.0);
        assert_eq!(r.session_hours, 0.0);
    }

    #[test]
    fn one_hour_at_constant_rate() {
        let mut t = CumulativeDoseTracker::new();
        t.add(0.5, 0);
        for s in 1..=3600 {
            t.add(0.5, s * 1000);
        }
        assert!((t.total_usv() - 0.5).abs() < 1e-9);

        let r = t.result(10.0).unwrap();
        assert!((r.session_hours - 1.0).abs() < 1e-12);
        assert!((r.percent_of_limit - 5.0).abs() < 1e-6);
        assert!((r.projected_daily - 12.0).abs() < 1e-12);
        assert!((r.hours_to_limit - 19.0).abs() < 1e-6);
        assert!(!r.limit_exceeded);
    }

    #[test]
    fn backwards_time_contributes_nothing() {
        let mut t = CumulativeDoseTracker::new();
        t.add(1.0, 10_000);
        t.add(1.0, 5_000);
        t.add(1.0, 5_000);
        assert_eq!(t.total_usv(), 0.0);
    }

    #[test]
    fn limit_reached() {
        let mut t = CumulativeDoseTracker::new();
        t.add(100.0, 0);
        t.add(100.0, 3_600_000);
        let r = t.result(50.0).unwrap();
        assert!(r.limit_exceeded);
        assert_eq!(r.remaining, 0.0);
        assert!(r.hours_to_limit.is_infinite());
    }

    #[test]
    fn zero_rate_never_reaches_limit() {
        let mut t = CumulativeDoseTracker::new();
        t.add(0.0, 0);
        let r = t.result(10.0).unwrap();
        assert!(r.hours_to_limit.is_infinite());
    }

    #[test]
    fn rejects_non_positive_limit() {
        let t = CumulativeDoseTracker::new();
        assert!(t.result(0.0).is_err());
        assert!(t.result(f64::NAN).is_err());
    }
}
