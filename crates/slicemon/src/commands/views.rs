//! Table rows and renderers shared by the monitoring commands.

use std::sync::Arc;

use tabled::Tabled;

use slicemon_core::{Alert, HistoricalViolation, MetricSample, Violation};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Alerts ──────────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn alert_row(alert: &Alert, color: bool) -> AlertRow {
    AlertRow {
        id: alert.id.to_string(),
        time: alert.timestamp.format(TIME_FORMAT).to_string(),
        severity: output::severity_label(alert.severity, color),
        message: alert.message.clone(),
    }
}

/// One line per alert: `#id [severity] message`.
pub fn alert_line(alert: &Alert, color: bool) -> String {
    format!(
        "#{} [{}] {}",
        alert.id,
        output::severity_label(alert.severity, color),
        alert.message
    )
}

pub fn render_alerts(
    format: OutputFormat,
    alerts: &[Arc<Alert>],
    color: bool,
) -> Result<String, CliError> {
    output::render_list(
        format,
        alerts,
        |a| alert_row(a, color),
        |a| alert_line(a, false),
    )
}

// ── Violations ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ViolationRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Threshold")]
    threshold: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn violation_row(v: &Violation, color: bool) -> ViolationRow {
    ViolationRow {
        metric: v.metric.to_string(),
        value: output::measurement(v.value),
        threshold: output::number(v.threshold),
        level: output::severity_label(v.level, color),
        message: v.message.clone(),
    }
}

pub fn render_violations(
    format: OutputFormat,
    violations: &[Violation],
    color: bool,
) -> Result<String, CliError> {
    output::render_list(
        format,
        violations,
        |v| violation_row(v, color),
        |v| format!("{} {} {}", v.metric, output::measurement(v.value), v.level),
    )
}

#[derive(Tabled)]
struct HistoricalRow {
    #[tabled(rename = "Seq")]
    seq: u64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Violations")]
    violations: String,
}

pub fn render_historical(
    format: OutputFormat,
    rows: &[HistoricalViolation],
) -> Result<String, CliError> {
    output::render_list(
        format,
        rows,
        |h| HistoricalRow {
            seq: h.seq,
            time: h.timestamp.format(TIME_FORMAT).to_string(),
            violations: h
                .violations
                .iter()
                .map(|v| format!("{} {}", v.metric, output::measurement(v.value)))
                .collect::<Vec<_>>()
                .join(", "),
        },
        |h| {
            let metrics: Vec<String> = h.violations.iter().map(|v| v.metric.to_string()).collect();
            format!("{} {}", h.seq, metrics.join(","))
        },
    )
}

// ── History ─────────────────────────────────────────────────────────

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Seq")]
    seq: u64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Values")]
    values: String,
}

fn sample_values(sample: &MetricSample) -> String {
    match sample {
        MetricSample::Builtin(s) => format!(
            "bandwidth={} latency={} reliability={}",
            output::measurement(s.bandwidth),
            output::measurement(s.latency),
            output::measurement(s.reliability)
        ),
        MetricSample::Custom(s) => s
            .values
            .iter()
            .map(|(name, value)| format!("{name}={}", output::measurement(*value)))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn sample_kind(sample: &MetricSample) -> &'static str {
    match sample {
        MetricSample::Builtin(_) => "builtin",
        MetricSample::Custom(_) => "custom",
    }
}

/// One sample on a single line, for live feeds.
pub fn sample_line(sample: &MetricSample) -> String {
    format!(
        "#{} {} {}",
        sample.seq(),
        sample_kind(sample),
        sample_values(sample)
    )
}

pub fn render_history(
    format: OutputFormat,
    history: &[Arc<MetricSample>],
) -> Result<String, CliError> {
    output::render_list(
        format,
        history,
        |s| SampleRow {
            seq: s.seq(),
            time: s.timestamp().format(TIME_FORMAT).to_string(),
            kind: sample_kind(s),
            values: sample_values(s),
        },
        |s| format!("{} {}", s.seq(), sample_values(s)),
    )
}
