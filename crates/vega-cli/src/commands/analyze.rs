//! Replay a recorded sample stream through the engine

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vega_analytics::{
    evaluate_triggers, AnalysisSnapshot, BaselineStats, CumulativeDoseResult, RadiationEngine,
    StatisticalTrigger, TriggerSeverity,
};

use crate::config::VegaConfig;
use crate::error::{CliError, CliResult};
use crate::output::{finite_or, json_line, OutputFormat};

/// Default daily dose budget, μSv.
pub const DEFAULT_DAILY_LIMIT_USV: f64 = 10.0;

/// Spacing assumed for samples that carry no time at all.
const DEFAULT_CADENCE_MS: i64 = 1000;

/// Arguments of `vega analyze`
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// JSON-lines sample file (stdin when omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Print every snapshot, not only readings that raise triggers
    #[arg(short, long)]
    pub snapshots: bool,

    /// Daily dose budget for the cumulative summary, μSv
    #[arg(long, default_value_t = DEFAULT_DAILY_LIMIT_USV)]
    pub daily_limit: f64,
}

/// One line of input.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRecord {
    /// Dose rate, μSv/h
    pub dose_rate: f64,
    /// Count rate, counts per second
    pub cps: f64,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    /// RFC 3339 time, used when `timestamp_ms` is absent
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Per-reading output line.
#[derive(Debug, Serialize)]
struct ReadingOutput<'a> {
    timestamp_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    cell_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dose: Option<&'a AnalysisSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count_rate: Option<&'a AnalysisSnapshot>,
    triggers: &'a [StatisticalTrigger],
}

/// End-of-stream summary.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub readings: u64,
    pub rejected: u64,
    pub triggers: u64,
    pub critical: u64,
    pub cumulative_dose: CumulativeDoseResult,
    pub dose_baseline: BaselineStats,
    pub count_baseline: BaselineStats,
}

/// Execute `vega analyze`
pub fn execute(args: AnalyzeArgs, config: &VegaConfig, format: OutputFormat) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = match &args.input {
        Some(path) => {
            info!(path = %path.display(), "replaying sample file");
            let reader = BufReader::new(File::open(path)?);
            analyze_stream(reader, &args, config, format, &mut out)?
        }
        None => analyze_stream(io::stdin().lock(), &args, config, format, &mut out)?,
    };
    print_report(&report, format, &mut out)
}

/// Derive the reading time: explicit millis, then RFC 3339, then the cadence.
fn resolve_timestamp(record: &SampleRecord, previous: Option<i64>) -> i64 {
    record
        .timestamp_ms
        .or_else(|| record.time.map(|t| t.timestamp_millis()))
        .unwrap_or_else(|| previous.map_or(0, |p| p.saturating_add(DEFAULT_CADENCE_MS)))
}

/// Feed every line of `reader` through a fresh engine, writing results to `out`.
pub fn analyze_stream<R: BufRead, W: Write>(
    reader: R,
    args: &AnalyzeArgs,
    config: &VegaConfig,
    format: OutputFormat,
    out: &mut W,
) -> CliResult<AnalysisReport> {
    if !(args.daily_limit > 0.0 && args.daily_limit.is_finite()) {
        return Err(CliError::InvalidArgument(format!(
            "--daily-limit must be a positive number of μSv, got {}",
            args.daily_limit
        )));
    }
    let engine = RadiationEngine::new(config.engine.clone())?;
    let mut previous = None;
    let mut rejected = 0u64;
    let mut fired = 0u64;
    let mut critical = 0u64;
    let mut cell_id: Option<String> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: SampleRecord =
            serde_json::from_str(&line).map_err(|e| CliError::InvalidInput {
                line: line_no,
                detail: e.to_string(),
            })?;

        match (record.lat, record.lng) {
            (Some(lat), Some(lng)) => {
                let cell = config.grid.cell_id(lat, lng);
                engine.set_current_location(lat, lng, cell.clone())?;
                cell_id = Some(cell);
            }
            (None, None) => {}
            _ => {
                return Err(CliError::InvalidInput {
                    line: line_no,
                    detail: "lat and lng must be given together".into(),
                })
            }
        }

        let timestamp_ms = resolve_timestamp(&record, previous);
        previous = Some(timestamp_ms);

        let (dose, cps) = engine.add_reading(record.dose_rate, record.cps, timestamp_ms)?;
        if !dose.accepted {
            rejected += 1;
            warn!(line = line_no, "sample rejected");
            continue;
        }

        let triggers = evaluate_triggers(&dose, &cps, &config.alerts);
        fired += triggers.len() as u64;
        critical += triggers
            .iter()
            .filter(|t| t.severity == TriggerSeverity::Critical)
            .count() as u64;
        debug!(line = line_no, triggers = triggers.len(), "sample analyzed");

        if triggers.is_empty() && !args.snapshots {
            continue;
        }
        match format {
            OutputFormat::Json => {
                let row = ReadingOutput {
                    timestamp_ms,
                    cell_id: cell_id.as_deref(),
                    dose: args.snapshots.then_some(&dose),
                    count_rate: args.snapshots.then_some(&cps),
                    triggers: &triggers,
                };
                json_line(out, &row)?;
            }
            OutputFormat::Table => {
                if args.snapshots {
                    print_snapshot_row(&dose, &cps, out)?;
                }
                for trigger in &triggers {
                    print_trigger_row(trigger, out)?;
                }
            }
        }
    }

    Ok(AnalysisReport {
        readings: engine.readings_processed()?,
        rejected,
        triggers: fired,
        critical,
        cumulative_dose: engine.cumulative_dose(args.daily_limit)?,
        dose_baseline: engine.dose_baseline()?,
        count_baseline: engine.count_baseline()?,
    })
}

fn print_snapshot_row<W: Write>(
    dose: &AnalysisSnapshot,
    cps: &AnalysisSnapshot,
    out: &mut W,
) -> CliResult<()> {
    let forecast = dose.earliest_forecast();
    writeln!(
        out,
        "{:>14}  {:>8.3} μSv/h  z {:>6.2}  {:<7}  cusum {:>7.3}  f{}s {:>8}  {:>8.1} cps",
        dose.timestamp_ms,
        dose.value,
        dose.z_score.z_score,
        dose.rate_of_change.trend.to_string(),
        dose.cusum.cusum_high,
        forecast.horizon_seconds,
        if forecast.available {
            format!("{:.3}", forecast.predicted)
        } else {
            "-".to_string()
        },
        cps.value,
    )?;
    Ok(())
}

fn print_trigger_row<W: Write>(trigger: &StatisticalTrigger, out: &mut W) -> CliResult<()> {
    let severity = match trigger.severity {
        TriggerSeverity::Critical => trigger.severity.to_string().red().bold(),
        TriggerSeverity::Warning => trigger.severity.to_string().yellow(),
        TriggerSeverity::Info => trigger.severity.to_string().cyan(),
    };
    writeln!(
        out,
        "{:>14}  {:<8} {:<20} {}",
        trigger.timestamp_ms,
        severity,
        trigger.trigger_type.to_string().bold(),
        trigger.message
    )?;
    Ok(())
}

fn print_report<W: Write>(
    report: &AnalysisReport,
    format: OutputFormat,
    out: &mut W,
) -> CliResult<()> {
    if format == OutputFormat::Json {
        return json_line(out, &serde_json::json!({ "summary": report }));
    }

    let dose = &report.cumulative_dose;
    writeln!(out)?;
    writeln!(out, "{}", "Replay Summary".bold().cyan())?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "  Readings analyzed:  {}", report.readings)?;
    writeln!(out, "  Readings rejected:  {}", report.rejected)?;
    writeln!(
        out,
        "  Triggers fired:     {} ({} critical)",
        report.triggers, report.critical
    )?;
    writeln!(out)?;
    writeln!(out, "  {}", "Cumulative Dose".bold())?;
    writeln!(out, "      Total:          {:.4} μSv", dose.total_usv)?;
    writeln!(out, "      Session:        {:.2} h", dose.session_hours)?;
    writeln!(out, "      Current rate:   {:.3} μSv/h", dose.current_rate)?;
    writeln!(out, "      Projected/day:  {:.3} μSv", dose.projected_daily)?;
    let limit_line = format!(
        "{:.1}% of {:.1} μSv, {} h to limit",
        dose.percent_of_limit,
        dose.daily_limit,
        finite_or(dose.hours_to_limit, "∞", 1)
    );
    if dose.limit_exceeded {
        writeln!(out, "      Limit:          {}", limit_line.red().bold())?;
    } else {
        writeln!(out, "      Limit:          {}", limit_line.green())?;
    }
    writeln!(out)?;
    writeln!(out, "  {}", "Baselines".bold())?;
    for (label, b, unit) in [
        ("Dose rate", &report.dose_baseline, "μSv/h"),
        ("Count rate", &report.count_baseline, "cps"),
    ] {
        let state = if b.is_valid() {
            "valid".green()
        } else {
            "learning".yellow()
        };
        writeln!(
            out,
            "      {:<15} {:.4} ± {:.4} {} ({} samples, {})",
            format!("{}:", label),
            b.mean,
            b.std_dev,
            unit,
            b.sample_count,
            state
        )?;
    }
    Ok(())
}
