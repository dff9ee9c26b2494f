//! Integration tests for the `slicemon` CLI binary.
//!
//! Every test points `--config` at a temporary directory so the user's real
//! configuration is never read or written.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `slicemon` binary with env isolation.
fn slicemon_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("slicemon");
    cmd.env("HOME", "/tmp/slicemon-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/slicemon-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("SLICEMON_CONFIG")
        .env_remove("SLICEMON_OUTPUT")
        .env_remove("SLICEMON_THRESHOLDS__BANDWIDTH")
        .env_remove("SLICEMON_THRESHOLDS__LATENCY")
        .env_remove("SLICEMON_THRESHOLDS__RELIABILITY");
    cmd
}

/// A scratch directory holding the config file for one test.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn with_config(contents: &str) -> Self {
        let ws = Self::new();
        std::fs::write(ws.config(), contents).unwrap();
        ws
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = slicemon_cmd();
        cmd.arg("--config").arg(self.config());
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(["-o", "json"]).args(args).output().unwrap();
        assert!(
            output.status.success(),
            "command {args:?} failed:\n{}",
            combined_output(&output)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn exit_code(cmd: &mut assert_cmd::Command) -> Option<i32> {
    cmd.output().unwrap().status.code()
}

fn file_contents(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = slicemon_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    slicemon_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("watch")
            .and(predicate::str::contains("simulate"))
            .and(predicate::str::contains("evaluate"))
            .and(predicate::str::contains("thresholds")),
    );
}

#[test]
fn test_version_flag() {
    slicemon_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("slicemon"));
}

#[test]
fn test_invalid_subcommand() {
    let output = slicemon_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

#[test]
fn test_invalid_output_format() {
    let ws = Workspace::new();
    let output = ws
        .cmd()
        .args(["--output", "invalid", "thresholds", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    slicemon_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    slicemon_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(ws.config().display().to_string()));
}

#[test]
fn test_config_show_without_file_renders_defaults() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("sample_interval_ms = 5000")
                .and(predicate::str::contains("thresholds")),
        );
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let ws = Workspace::new();
    ws.cmd().args(["config", "init"]).assert().success();
    assert!(file_contents(&ws.config()).contains("[monitor]"));

    assert_eq!(exit_code(ws.cmd().args(["config", "init"])), Some(6));
    ws.cmd()
        .args(["config", "init", "--force", "--yes"])
        .assert()
        .success();
}

#[test]
fn test_invalid_config_exits_with_config_code() {
    let ws = Workspace::with_config("[monitor]\nhistory_capacity = 0\n");
    let output = ws
        .cmd()
        .args(["evaluate", "-b", "1", "-l", "1", "-r", "99"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(9));
    assert!(combined_output(&output).contains("monitor.history_capacity"));
}

// ── Evaluate ────────────────────────────────────────────────────────

#[test]
fn test_evaluate_single_violation() {
    let ws = Workspace::new();
    let violations = ws.json(&["evaluate", "-b", "95", "-l", "50", "-r", "99"]);
    let violations = violations.as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["metric"], "bandwidth");
    assert_eq!(violations[0]["level"], "warning");
    assert_eq!(violations[0]["message"], "Bandwidth usage exceeded threshold");
}

#[test]
fn test_evaluate_reports_each_breached_metric() {
    let ws = Workspace::new();
    let violations = ws.json(&["evaluate", "-b", "95", "-l", "130", "-r", "90"]);
    let metrics: Vec<&str> = violations
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["metric"].as_str().unwrap())
        .collect();
    assert_eq!(metrics, ["bandwidth", "latency", "reliability"]);
}

#[test]
fn test_evaluate_within_thresholds() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["evaluate", "-b", "10", "-l", "10", "-r", "99"])
        .assert()
        .success()
        .stderr(predicate::str::contains("within thresholds"));
}

#[test]
fn test_evaluate_custom_metric() {
    let ws = Workspace::with_config(
        "[[custom_metrics]]\nname = \"custom1\"\ncondition = \">\"\nthreshold = 50\n",
    );
    let violations = ws.json(&[
        "evaluate", "-b", "10", "-l", "10", "-r", "99", "--custom", "custom1=60",
    ]);
    let violations = violations.as_array().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["metric"], "custom1");

    let quiet = ws.json(&[
        "evaluate", "-b", "10", "-l", "10", "-r", "99", "--custom", "custom1=40",
    ]);
    assert_eq!(quiet, Value::Array(Vec::new()));
}

#[test]
fn test_evaluate_unknown_custom_metric() {
    let ws = Workspace::new();
    let code = exit_code(ws.cmd().args([
        "evaluate", "-b", "1", "-l", "1", "-r", "99", "--custom", "nope=1",
    ]));
    assert_eq!(code, Some(4));
}

// ── Simulate ────────────────────────────────────────────────────────

#[test]
fn test_simulate_history_is_capped() {
    let ws = Workspace::new();
    let history = ws.json(&["simulate", "--ticks", "30", "--seed", "7", "--show", "history"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 20);
    assert_eq!(history[0]["seq"], 11);
    assert!(history.iter().all(|s| s["kind"] == "builtin"));
}

#[test]
fn test_simulate_seed_is_reproducible() {
    let ws = Workspace::new();
    let args = ["simulate", "--ticks", "5", "--seed", "42", "--show", "history"];
    let bandwidths = |v: &Value| -> Vec<f64> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|s| s["bandwidth"].as_f64().unwrap())
            .collect()
    };
    assert_eq!(bandwidths(&ws.json(&args)), bandwidths(&ws.json(&args)));
}

#[test]
fn test_simulate_alerts_are_capped_and_newest_first() {
    let ws = Workspace::with_config("[thresholds]\nbandwidth = 0\n");
    let alerts = ws.json(&["simulate", "--ticks", "15", "--seed", "3"]);
    let ids: Vec<u64> = alerts
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 10);
    assert!(ids.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn test_simulate_without_auto_alert_raises_nothing() {
    let ws = Workspace::with_config("[thresholds]\nbandwidth = 0\n");
    let alerts = ws.json(&["simulate", "--ticks", "5", "--no-auto-alert"]);
    assert_eq!(alerts, Value::Array(Vec::new()));
}

// ── Thresholds / metrics / actions ──────────────────────────────────

#[test]
fn test_thresholds_set_persists() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["thresholds", "set", "--latency", "110", "--latency-critical", "140"])
        .assert()
        .success();

    let rows = ws.json(&["thresholds", "show"]);
    let latency = &rows.as_array().unwrap()[1];
    assert_eq!(latency["metric"], "latency");
    assert_eq!(latency["warning"], 110.0);
    assert_eq!(latency["critical"], 140.0);
}

#[test]
fn test_thresholds_set_requires_a_flag() {
    let ws = Workspace::new();
    assert_eq!(exit_code(ws.cmd().args(["thresholds", "set"])), Some(2));
}

#[test]
fn test_metrics_add_list_remove() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["metrics", "add", "jitter", "--threshold", "50", "--unit", "ms"])
        .assert()
        .success();

    ws.cmd()
        .args(["-o", "plain", "metrics", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jitter"));

    assert_eq!(
        exit_code(ws.cmd().args(["metrics", "add", "jitter"])),
        Some(6)
    );
    assert_eq!(
        exit_code(ws.cmd().args(["metrics", "add", "latency"])),
        Some(2)
    );

    ws.cmd().args(["metrics", "remove", "jitter"]).assert().success();
    assert_eq!(
        exit_code(ws.cmd().args(["metrics", "remove", "jitter"])),
        Some(4)
    );
}

#[test]
fn test_actions_add_and_list() {
    let ws = Workspace::new();
    ws.cmd()
        .args([
            "actions", "add", "latency", "--threshold", "130", "--action", "scale", "--param",
            "replicas=2",
        ])
        .assert()
        .success();

    let rules = ws.json(&["actions", "list"]);
    let rule = &rules.as_array().unwrap()[0];
    assert_eq!(rule["metric"], "latency");
    assert_eq!(rule["condition"], "above");
    assert_eq!(rule["action"], "scale");
    assert_eq!(rule["parameters"]["replicas"], "2");
}

// ── Watch ───────────────────────────────────────────────────────────

#[test]
fn test_watch_streams_alerts_and_saves_state() {
    let ws = Workspace::with_config(
        "[monitor]\nsample_interval_ms = 50\ncustom_interval_ms = 50\n\n\
         [thresholds]\nbandwidth = 0\n",
    );
    let state = ws.path("state.json");

    let output = ws
        .cmd()
        .args(["-o", "json-compact", "watch", "--duration", "400ms", "--seed", "1"])
        .arg("--state")
        .arg(&state)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"severity\""), "no alerts streamed:\n{stdout}");
    assert!(file_contents(&state).contains("monitor.settings"));
}

#[test]
fn test_watch_samples_prints_each_tick() {
    let ws =
        Workspace::with_config("[monitor]\nsample_interval_ms = 50\ncustom_interval_ms = 50\n");

    let output = ws
        .cmd()
        .args(["-o", "json-compact", "watch", "--duration", "300ms", "--samples"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let seqs: Vec<u64> = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter(|doc| doc["kind"] == "builtin")
        .filter_map(|doc| doc["seq"].as_u64())
        .collect();
    assert!(!seqs.is_empty(), "no samples printed:\n{stdout}");
    assert!(seqs.windows(2).all(|w| w[0] < w[1]), "samples out of order: {seqs:?}");
}
