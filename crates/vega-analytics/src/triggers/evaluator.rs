//! Stateless rule evaluation over a pair of snapshots.

use crate::anomaly::{Deviation, ShiftDirection, Trend};
use crate::baseline::Channel;
use crate::invariants::Z_95;
use crate::snapshot::AnalysisSnapshot;
use crate::spatial::LocationStatus;
use crate::triggers::config::StatisticalAlertConfig;
use crate::triggers::types::{StatisticalTrigger, TriggerSeverity, TriggerType};

/// Seconds-to-threshold at or under which a predicted crossing is critical.
const IMMINENT_CROSSING_SECS: f64 = 10.0;

/// Evaluate every enabled rule. Several triggers may fire for one reading.
pub fn evaluate_triggers(
    dose: &AnalysisSnapshot,
    cps: &AnalysisSnapshot,
    config: &StatisticalAlertConfig,
) -> Vec<StatisticalTrigger> {
    let mut out = Vec::new();
    if !config.enabled {
        return out;
    }

    for snap in [dose, cps] {
        if !snap.accepted {
            continue;
        }
        if config.z_score_enabled {
            out.extend(z_score_rule(snap, config));
        }
        if config.rate_of_change_enabled {
            out.extend(rate_rule(snap, config));
        }
        if config.cusum_enabled {
            out.extend(cusum_rule(snap));
        }
        if config.changepoint_enabled {
            out.extend(changepoint_rule(snap));
        }
    }

    if dose.accepted {
        if config.forecast_enabled {
            out.extend(forecast_rule(dose, config));
        }
        if config.predictive_enabled {
            out.extend(predictive_crossing_rule(dose, config));
        }
        if config.location_enabled {
            out.extend(location_rule(dose));
        }
    }
    out
}

fn fmt_value(channel: Channel, value: f64) -> String {
    match channel {
        Channel::Dose => format!("{:.3} {}", value, channel.unit()),
        Channel::CountRate => format!("{:.1} {}", value, channel.unit()),
    }
}

fn trigger(
    snap: &AnalysisSnapshot,
    trigger_type: TriggerType,
    severity: TriggerSeverity,
    message: String,
    confidence: f64,
    detected_value: f64,
    threshold_value: f64,
) -> StatisticalTrigger {
    StatisticalTrigger {
        trigger_type,
        channel: snap.channel,
        severity,
        message,
        confidence: confidence.clamp(0.0, 1.0),
        detected_value,
        threshold_value,
        timestamp_ms: snap.timestamp_ms,
    }
}

// ── Channel rules ───────────────────────────────────────────────────────

fn z_score_rule(
    snap: &AnalysisSnapshot,
    config: &StatisticalAlertConfig,
) -> Option<StatisticalTrigger> {
    let z = &snap.z_score;
    if !z.is_anomaly || z.z_score.abs() < config.z_score_sigma {
        return None;
    }
    let sign = if z.z_score > 0.0 { 1.0 } else { -1.0 };
    let boundary = snap.baseline.mean + sign * config.z_score_sigma * snap.baseline.std_dev;
    let side = match z.direction {
        Deviation::Below => "below",
        _ => "above",
    };
    Some(trigger(
        snap,
        TriggerType::ZScoreAnomaly,
        if z.sigma_level >= 4 {
            TriggerSeverity::Critical
        } else {
            TriggerSeverity::Warning
        },
        format!(
            "{} {} is {:.1}σ {} baseline {}",
            snap.channel.label(),
            fmt_value(snap.channel, snap.value),
            z.z_score.abs(),
            side,
            fmt_value(snap.channel, snap.baseline.mean),
        ),
        z.confidence_percent / 100.0,
        snap.value,
        boundary,
    ))
}

fn rate_rule(
    snap: &AnalysisSnapshot,
    config: &StatisticalAlertConfig,
) -> Option<StatisticalTrigger> {
    let r = &snap.rate_of_change;
    if !r.is_significant || r.percent_per_second.abs() < config.rate_percent_per_second {
        return None;
    }
    let severity = match r.trend {
        Trend::Rising => TriggerSeverity::Warning,
        _ => TriggerSeverity::Info,
    };
    Some(trigger(
        snap,
        TriggerType::RateOfChange,
        severity,
        format!(
            "{} {} {:.1}%/s ({} consecutive)",
            snap.channel.label(),
            r.trend,
            r.percent_per_second.abs(),
            r.consecutive_count
        ),
        r.percent_per_second.abs() / (2.0 * config.rate_percent_per_second),
        r.percent_per_second,
        config.rate_percent_per_second,
    ))
}

fn cusum_rule(snap: &AnalysisSnapshot) -> Option<StatisticalTrigger> {
    let c = &snap.cusum;
    if !c.change_detected {
        return None;
    }
    let (severity, statistic) = match c.direction {
        ShiftDirection::Increase => (TriggerSeverity::Warning, c.cusum_high),
        _ => (TriggerSeverity::Info, -c.cusum_low),
    };
    Some(trigger(
        snap,
        TriggerType::CusumChange,
        severity,
        format!(
            "Sustained {} in {} (CUSUM {:.3} > {:.3})",
            c.direction,
            snap.channel.label().to_lowercase(),
            statistic,
            c.threshold
        ),
        c.confidence,
        statistic,
        c.threshold,
    ))
}

fn changepoint_rule(snap: &AnalysisSnapshot) -> Option<StatisticalTrigger> {
    let cp = &snap.changepoint;
    if !cp.is_changepoint {
        return None;
    }
    Some(trigger(
        snap,
        TriggerType::Changepoint,
        TriggerSeverity::Info,
        format!(
            "Regime change in {}: run mean {} vs baseline {}",
            snap.channel.label().to_lowercase(),
            fmt_value(snap.channel, cp.run_mean),
            fmt_value(snap.channel, snap.baseline.mean),
        ),
        cp.probability,
        cp.run_mean,
        snap.baseline.mean,
    ))
}

// ── Dose rules ──────────────────────────────────────────────────────────

fn forecast_rule(
    dose: &AnalysisSnapshot,
    config: &StatisticalAlertConfig,
) -> Option<StatisticalTrigger> {
    let f = dose.earliest_forecast();
    let threshold = config.forecast_threshold;
    if !f.available || dose.value >= threshold || f.predicted <= threshold {
        return None;
    }
    let confidence = if f.uncertainty > 0.0 {
        (f.predicted - threshold) / (Z_95 * f.uncertainty)
    } else {
        1.0
    };
    Some(trigger(
        dose,
        TriggerType::ForecastThreshold,
        TriggerSeverity::Warning,
        format!(
            "Dose rate forecast to reach {} within {} s (threshold {})",
            fmt_value(Channel::Dose, f.predicted),
            f.horizon_seconds,
            fmt_value(Channel::Dose, threshold),
        ),
        confidence,
        f.predicted,
        threshold,
    ))
}

fn predictive_crossing_rule(
    dose: &AnalysisSnapshot,
    config: &StatisticalAlertConfig,
) -> Option<StatisticalTrigger> {
    let r = &dose.rate_of_change;
    if r.trend != Trend::Rising || r.rate_per_second <= 0.0 {
        return None;
    }
    let nearest = config
        .alert_thresholds
        .iter()
        .copied()
        .filter(|t| *t > dose.value)
        .min_by(f64::total_cmp)?;
    let seconds = (nearest - dose.value) / r.rate_per_second;
    if seconds > config.warning_window_secs {
        return None;
    }
    Some(trigger(
        dose,
        TriggerType::PredictiveCrossing,
        if seconds <= IMMINENT_CROSSING_SECS {
            TriggerSeverity::Critical
        } else {
            TriggerSeverity::Warning
        },
        format!(
            "Dose rate {} rising {:.4} μSv/h per second; projected to cross {} in ~{:.0} s",
            fmt_value(Channel::Dose, dose.value),
            r.rate_per_second,
            fmt_value(Channel::Dose, nearest),
            seconds
        ),
        (f64::from(r.consecutive_count) / 5.0).max(0.2),
        dose.value,
        nearest,
    ))
}

fn location_rule(dose: &AnalysisSnapshot) -> Option<StatisticalTrigger> {
    let loc = &dose.location;
    if !loc.is_anomaly {
        return None;
    }
    let severity = match loc.status {
        LocationStatus::Elevated => TriggerSeverity::Warning,
        _ => TriggerSeverity::Info,
    };
    Some(trigger(
        dose,
        TriggerType::LocationAnomaly,
        severity,
        format!(
            "Dose rate {} is {} for cell {} (cell mean {}, z {:.1})",
            fmt_value(Channel::Dose, dose.value),
            loc.status,
            loc.cell_id.as_deref().unwrap_or("?"),
            fmt_value(Channel::Dose, loc.cell_mean),
            loc.z_score
        ),
        loc.z_score.abs() / 4.0,
        dose.value,
        loc.cell_mean,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{ChangepointResult, CusumResult, RateOfChangeResult, ZScoreResult};
    use crate::baseline::BaselineStats;
    use crate::forecast::ForecastResult;
    use crate::spatial::LocationAnomalyResult;

    fn snap(channel: Channel, value: f64) -> AnalysisSnapshot {
        let mut s = AnalysisSnapshot::neutral(channel, value, 1_000);
        s.accepted = true;
        s.baseline = BaselineStats {
            mean: value,
            variance: 0.0001,
            std_dev: 0.01,
            sample_count: 100,
            ..BaselineStats::EMPTY
        };
        s
    }

    fn rising(rate_per_second: f64, consecutive: u32) -> RateOfChangeResult {
        RateOfChangeResult {
            rate_per_second,
            percent_per_second: 5.0,
            trend: Trend::Rising,
            is_significant: true,
            consecutive_count: consecutive,
        }
    }

    fn quiet() -> StatisticalAlertConfig {
        StatisticalAlertConfig {
            forecast_enabled: false,
            ..Default::default()
        }
    }

    fn types(triggers: &[StatisticalTrigger]) -> Vec<TriggerType> {
        triggers.iter().map(|t| t.trigger_type).collect()
    }

    #[test]
    fn neutral_snapshots_fire_nothing() {
        let t = evaluate_triggers(
            &snap(Channel::Dose, 0.1),
            &snap(Channel::CountRate, 20.0),
            &StatisticalAlertConfig::default(),
        );
        assert!(t.is_empty());
    }

    #[test]
    fn predictive_crossing_five_seconds_out() {
        let mut dose = snap(Channel::Dose, 0.40);
        dose.rate_of_change = rising(0.02, 4);
        let t = evaluate_triggers(&dose, &snap(Channel::CountRate, 20.0), &quiet());
        assert_eq!(types(&t), vec![TriggerType::PredictiveCrossing]);
        assert!(t[0].message.contains("~5 s"), "{}", t[0].message);
        assert_eq!(t[0].threshold_value, 0.5);
        assert_eq!(t[0].severity, TriggerSeverity::Critical);
    }

    #[test]
    fn predictive_crossing_picks_nearest_uncrossed_threshold() {
        let mut dose = snap(Channel::Dose, 0.6);
        dose.rate_of_change = rising(0.01, 2);
        let t = evaluate_triggers(&dose, &snap(Channel::CountRate, 20.0), &quiet());
        assert_eq!(t[0].threshold_value, 1.0);
        assert_eq!(t[0].severity, TriggerSeverity::Warning);

        // 0.4 μSv/h away at 0.001/s is 400 s: outside the window.
        dose.rate_of_change = rising(0.001, 2);
        assert!(evaluate_triggers(&dose, &snap(Channel::CountRate, 20.0), &quiet()).is_empty());
    }

    #[test]
    fn z_score_rule_respects_sigma() {
        let mut dose = snap(Channel::Dose, 1.0);
        dose.baseline.mean = 0.19;
        dose.z_score = ZScoreResult::from_z(3.16);
        let t = evaluate_triggers(&dose, &snap(Channel::CountRate, 20.0), &quiet());
        assert_eq!(types(&t), vec![TriggerType::ZScoreAnomaly]);
        assert_eq!(t[0].severity, TriggerSeverity::Warning);
        assert!((t[0].confidence - 0.9973).abs() < 1e-9);

        dose.z_score = ZScoreResult::from_z(2.5);
        assert!(evaluate_triggers(&dose, &snap(Channel::CountRate, 20.0), &quiet()).is_empty());
    }

    #[test]
    fn cusum_on_both_channels() {
        let mut dose = snap(Channel::Dose, 0.1);
        let mut cps = snap(Channel::CountRate, 20.0);
        let fired = CusumResult {
            cusum_high: 0.05,
            cusum_low: 0.0,
            threshold: 0.04,
            change_detected: true,
            direction: ShiftDirection::Increase,
            confidence: 0.625,
        };
        dose.cusum = fired;
        cps.cusum = fired;
        let t = evaluate_triggers(&dose, &cps, &quiet());
        assert_eq!(types(&t), vec![TriggerType::CusumChange, TriggerType::CusumChange]);
        assert_eq!(t[1].channel, Channel::CountRate);
    }

    #[test]
    fn forecast_threshold_rule() {
        let mut dose = snap(Channel::Dose, 0.3);
        dose.forecasts[0] = ForecastResult {
            available: true,
            horizon_seconds: 30,
            predicted: 0.7,
            lower: 0.6,
            upper: 0.8,
            uncertainty: 0.05,
            trend_per_second: 0.01,
        };
        let t = evaluate_triggers(
            &dose,
            &snap(Channel::CountRate, 20.0),
            &StatisticalAlertConfig {
                predictive_enabled: false,
                ..Default::default()
            },
        );
        assert_eq!(types(&t), vec![TriggerType::ForecastThreshold]);
        assert_eq!(t[0].confidence, 1.0);

        // Already above: not a forecast warning.
        dose.value = 0.6;
        let t = evaluate_triggers(
            &dose,
            &snap(Channel::CountRate, 20.0),
            &StatisticalAlertConfig::default(),
        );
        assert!(t.is_empty());
    }

    #[test]
    fn supplements_behind_flags() {
        let mut dose = snap(Channel::Dose, 0.5);
        dose.changepoint = ChangepointResult {
            probability: 0.95,
            run_length: 1,
            run_mean: 0.5,
            deviation_sigma: 10.0,
            is_changepoint: true,
        };
        dose.location = LocationAnomalyResult {
            status: LocationStatus::Elevated,
            cell_id: Some("1:2".into()),
            sample_count: 6,
            cell_mean: 0.1,
            cell_std_dev: 0.01,
            z_score: 40.0,
            is_anomaly: true,
        };
        let cps = snap(Channel::CountRate, 20.0);
        assert!(evaluate_triggers(&dose, &cps, &quiet()).is_empty());

        let all = StatisticalAlertConfig {
            changepoint_enabled: true,
            location_enabled: true,
            ..quiet()
        };
        let t = evaluate_triggers(&dose, &cps, &all);
        assert_eq!(
            types(&t),
            vec![TriggerType::Changepoint, TriggerType::LocationAnomaly]
        );
        assert!(t[1].message.contains("1:2"));
    }

    #[test]
    fn master_switch() {
        let mut dose = snap(Channel::Dose, 0.40);
        dose.rate_of_change = rising(0.02, 4);
        let t = evaluate_triggers(
            &dose,
            &snap(Channel::CountRate, 20.0),
            &StatisticalAlertConfig::disabled(),
        );
        assert!(t.is_empty());
    }

    #[test]
    fn rejected_readings_are_skipped() {
        let mut dose = AnalysisSnapshot::neutral(Channel::Dose, 0.4, 0);
        dose.rate_of_change = rising(0.02, 4);
        let cps = AnalysisSnapshot::neutral(Channel::CountRate, 0.0, 0);
        assert!(evaluate_triggers(&dose, &cps, &StatisticalAlertConfig::default()).is_empty());
    }
}
