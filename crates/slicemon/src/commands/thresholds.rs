//! Threshold command handlers.

use serde::Serialize;
use tabled::Tabled;

use slicemon_core::{BuiltinMetric, Direction, Limit, ThresholdSet};

use crate::cli::{ThresholdsArgs, ThresholdsCommand, ThresholdsSetArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ThresholdEntry {
    metric: BuiltinMetric,
    #[serde(flatten)]
    limit: Limit,
}

#[derive(Tabled)]
struct ThresholdRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Breach when")]
    side: &'static str,
    #[tabled(rename = "Warning")]
    warning: String,
    #[tabled(rename = "Critical")]
    critical: String,
}

impl From<&ThresholdEntry> for ThresholdRow {
    fn from(e: &ThresholdEntry) -> Self {
        Self {
            metric: e.metric.to_string(),
            side: match e.metric.direction() {
                Direction::Upper => "above",
                Direction::Lower => "below",
            },
            warning: output::number(e.limit.warning),
            critical: e.limit.critical.map(output::number).unwrap_or_default(),
        }
    }
}

fn entries(thresholds: &ThresholdSet) -> Vec<ThresholdEntry> {
    BuiltinMetric::ALL
        .into_iter()
        .map(|metric| ThresholdEntry {
            metric,
            limit: *thresholds.limit(metric),
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ThresholdsArgs, ctx: &mut Context) -> Result<(), CliError> {
    match args.command {
        ThresholdsCommand::Show => show(ctx),

        ThresholdsCommand::Set(set) => {
            let updated = apply(ctx.config.thresholds, &set)?;
            ctx.config.thresholds = updated;
            ctx.save()?;
            output::print_status(
                &format!("Thresholds saved to {}", ctx.path.display()),
                ctx.quiet,
            );
            show(ctx)
        }
    }
}

fn show(ctx: &Context) -> Result<(), CliError> {
    let rows = entries(&ctx.config.thresholds);
    let out = output::render_list(ctx.format, &rows, |e| ThresholdRow::from(e), |e| {
        format!("{} {}", e.metric, output::number(e.limit.warning))
    })?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

/// Merge the flags into `current`. Fails when no flag was given or a bound
/// is invalid.
fn apply(mut current: ThresholdSet, set: &ThresholdsSetArgs) -> Result<ThresholdSet, CliError> {
    let changes = [
        (BuiltinMetric::Bandwidth, set.bandwidth, set.bandwidth_critical),
        (BuiltinMetric::Latency, set.latency, set.latency_critical),
        (BuiltinMetric::Reliability, set.reliability, set.reliability_critical),
    ];
    if !set.clear_critical && changes.iter().all(|(_, w, c)| w.is_none() && c.is_none()) {
        return Err(CliError::Validation {
            field: "thresholds".into(),
            reason: "give at least one limit to change, e.g. --latency 110".into(),
        });
    }

    for (metric, warning, critical) in changes {
        let limit = limit_mut(&mut current, metric);
        if set.clear_critical {
            limit.critical = None;
        }
        if let Some(warning) = warning {
            limit.warning = util::finite(&metric.to_string(), warning)?;
        }
        if let Some(critical) = critical {
            limit.critical = Some(util::finite(&format!("{metric}-critical"), critical)?);
        }
        limit
            .validate(metric.direction())
            .map_err(|reason| CliError::Validation {
                field: metric.to_string(),
                reason,
            })?;
    }
    Ok(current)
}

fn limit_mut(set: &mut ThresholdSet, metric: BuiltinMetric) -> &mut Limit {
    match metric {
        BuiltinMetric::Bandwidth => &mut set.bandwidth,
        BuiltinMetric::Latency => &mut set.latency,
        BuiltinMetric::Reliability => &mut set.reliability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ThresholdsSetArgs {
        ThresholdsSetArgs {
            bandwidth: None,
            bandwidth_critical: None,
            latency: None,
            latency_critical: None,
            reliability: None,
            reliability_critical: None,
            clear_critical: false,
        }
    }

    #[test]
    fn only_given_limits_change() {
        let set = ThresholdsSetArgs {
            latency: Some(110.0),
            latency_critical: Some(140.0),
            ..args()
        };
        let updated = apply(ThresholdSet::default(), &set).ok();
        let expected = ThresholdSet {
            latency: Limit::tiered(110.0, 140.0),
            ..ThresholdSet::default()
        };
        assert_eq!(updated, Some(expected));
    }

    #[test]
    fn no_flags_is_a_usage_error() {
        assert!(matches!(
            apply(ThresholdSet::default(), &args()),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn looser_critical_is_rejected() {
        let set = ThresholdsSetArgs {
            reliability_critical: Some(99.0),
            ..args()
        };
        assert!(apply(ThresholdSet::default(), &set).is_err());
    }

    #[test]
    fn clear_critical_drops_every_critical_limit() {
        let current = ThresholdSet {
            bandwidth: Limit::tiered(80.0, 90.0),
            ..ThresholdSet::default()
        };
        let set = ThresholdsSetArgs {
            clear_critical: true,
            ..args()
        };
        assert_eq!(apply(current, &set).ok(), Some(ThresholdSet::default()));
    }
}
