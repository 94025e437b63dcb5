//! Binary-level tests for `vega`.

use assert_cmd::Command;
use predicates::prelude::*;

fn vega() -> Command {
    let mut cmd = Command::cargo_bin("vega").unwrap();
    cmd.env_remove("VEGA_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn jump_stream() -> String {
    let mut lines: Vec<String> = (0..20)
        .map(|t| format!(r#"{{"dose_rate": 0.10, "cps": 20, "timestamp_ms": {}}}"#, t * 1000))
        .collect();
    lines.push(r#"{"dose_rate": 1.0, "cps": 200, "timestamp_ms": 20000}"#.into());
    lines.join("\n") + "\n"
}

#[test]
fn test_analyze_stdin_table() {
    vega()
        .arg("analyze")
        .write_stdin(jump_stream())
        .assert()
        .success()
        .stdout(predicate::str::contains("Z_SCORE_ANOMALY"))
        .stdout(predicate::str::contains("Replay Summary"))
        .stdout(predicate::str::contains("Readings analyzed:  21"));
}

#[test]
fn test_analyze_json_summary() {
    vega()
        .args(["--output", "json", "analyze", "--daily-limit", "2.5"])
        .write_stdin(jump_stream())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""summary""#))
        .stdout(predicate::str::contains(r#""daily_limit":2.5"#));
}

#[test]
fn test_analyze_rejects_malformed_line() {
    vega()
        .arg("analyze")
        .write_stdin("{\"dose_rate\": 0.1, \"cps\": 20}\n{oops}\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_analyze_rejects_zero_daily_limit() {
    vega()
        .args(["analyze", "--daily-limit", "0"])
        .write_stdin(jump_stream())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--daily-limit"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_cell_lookup() {
    vega()
        .args(["--output", "json", "cell", "--lat", "0", "--lng", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""cell_id": "0:0""#));
}

#[test]
fn test_cell_rejects_bad_size() {
    vega()
        .args(["cell", "--lat", "0", "--lng", "0", "--cell-size", "0"])
        .assert()
        .failure();
}

#[test]
fn test_config_dump_is_toml() {
    vega()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[engine.cusum]"))
        .stdout(predicate::str::contains("[alerts]"))
        .stdout(predicate::str::contains("cell_size_m = 25.0"));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    vega()
        .args(["--config", "/nonexistent/vega.toml", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("decision_sigma = 4.0"));
}
