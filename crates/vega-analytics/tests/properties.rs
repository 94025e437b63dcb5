//! Property tests over the streaming primitives.

use proptest::prelude::*;
use vega_analytics::anomaly::z_score;
use vega_analytics::config::ForecastConfig;
use vega_analytics::forecast::HoltWintersForecaster;
use vega_analytics::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// A plausible dose-rate stream, including zero and sharp drops.
fn arb_dose_stream(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![Just(0.0), 0.0f64..0.5, 0.5f64..50.0],
        min..max,
    )
}

/// A valid baseline: enough samples and a usable spread.
fn arb_baseline() -> impl Strategy<Value = BaselineStats> {
    (0.0f64..1000.0, 0.001f64..100.0).prop_map(|(mean, std_dev)| BaselineStats {
        mean,
        variance: std_dev * std_dev,
        std_dev,
        sample_count: 50,
        ..BaselineStats::EMPTY
    })
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Forecasts and their bands never go negative, whatever the stream did.
    #[test]
    fn forecasts_are_never_negative(values in arb_dose_stream(2, 200)) {
        let mut forecaster = HoltWintersForecaster::new(&ForecastConfig::default());
        let tracker = BaselineTracker::default();
        let mut baseline = BaselineStats::EMPTY;
        for (i, v) in values.iter().enumerate() {
            baseline = tracker.update(&baseline, *v, i as i64 * 1000);
            forecaster.update(*v);
        }
        for h in [30, 60, 300] {
            let f = forecaster.forecast(h, &baseline);
            prop_assert!(f.available);
            prop_assert!(f.predicted >= 0.0);
            prop_assert!(f.lower >= 0.0);
            prop_assert!(f.upper >= f.predicted);
        }
    }

    /// After capacity + k pushes the buffer holds the last `capacity` items in order.
    #[test]
    fn rolling_buffer_keeps_newest_in_order(capacity in 1usize..64, extra in 0usize..64) {
        let mut buffer = RollingBuffer::new(capacity);
        let total = capacity + extra;
        for i in 0..total {
            buffer.push(Sample::new(i as f64, i as i64));
        }
        let kept: Vec<i64> = buffer.iter().map(|s| s.timestamp_ms).collect();
        let expected: Vec<i64> = (extra as i64..total as i64).collect();
        prop_assert_eq!(kept, expected);
        prop_assert!(buffer.is_full());
    }

    /// A value k standard deviations from the mean scores ≈ k.
    #[test]
    fn z_score_is_symmetric(baseline in arb_baseline(), k in -6.0f64..6.0) {
        let value = baseline.mean + k * baseline.std_dev;
        let result = z_score(value, &baseline);
        prop_assert!((result.z_score - k).abs() < 1e-6);
        prop_assert_eq!(result.is_anomaly, result.z_score.abs() >= 2.0);

        let mirrored = z_score(baseline.mean - k * baseline.std_dev, &baseline);
        prop_assert!((mirrored.z_score + result.z_score).abs() < 1e-6);
    }

    /// Non-finite readings never change what the engine has learned.
    #[test]
    fn non_finite_readings_are_inert(
        values in arb_dose_stream(1, 40),
        bad in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)],
    ) {
        let engine = RadiationEngine::with_defaults();
        for (i, v) in values.iter().enumerate() {
            engine.add_reading(*v, v * 200.0, i as i64 * 1000).unwrap();
        }
        let before = engine.dose_baseline().unwrap();
        let dose_before = engine.cumulative_dose(10.0).unwrap().total_usv;

        let (dose, cps) = engine.add_reading(bad, 20.0, 1_000_000).unwrap();
        prop_assert!(!dose.accepted && !cps.accepted);
        prop_assert_eq!(engine.dose_baseline().unwrap(), before);
        prop_assert_eq!(engine.cumulative_dose(10.0).unwrap().total_usv, dose_before);
    }
}
