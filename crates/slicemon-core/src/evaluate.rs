// ── Threshold evaluation ──
//
// One pure function decides what counts as a violation. The live tick path
// and the violation-history view both go through it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    BuiltinMetric, CustomMetricDefinition, MetricName, MetricSample, Severity, ThresholdSet,
    Violation,
};

/// Evaluate one sample against the built-in thresholds and custom definitions.
///
/// Metrics missing from the sample, or carrying a non-finite value, are
/// skipped rather than reported.
pub fn evaluate(
    sample: &MetricSample,
    thresholds: &ThresholdSet,
    custom: &[Arc<CustomMetricDefinition>],
) -> Vec<Violation> {
    match sample {
        MetricSample::Builtin(s) => BuiltinMetric::ALL
            .into_iter()
            .filter_map(|metric| {
                let limit = thresholds.limit(metric);
                let value = s.value(metric);
                let level = limit.breach(value, metric.direction())?;
                Some(Violation {
                    metric: MetricName::Builtin(metric),
                    value,
                    threshold: limit.warning,
                    level,
                    message: metric.violation_message().to_owned(),
                })
            })
            .collect(),
        MetricSample::Custom(s) => custom
            .iter()
            .filter_map(|def| {
                let value = *s.values.get(&def.name)?;
                let level = def.threshold.breach(value, def.condition.direction())?;
                Some(Violation {
                    metric: MetricName::Custom(def.name.clone()),
                    value,
                    threshold: def.threshold.warning,
                    level,
                    message: format!(
                        "Custom metric \"{}\" {} {}",
                        def.name, def.condition, def.threshold.warning
                    ),
                })
            })
            .collect(),
    }
}

/// Violations re-derived for one historical sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalViolation {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub violations: Vec<Violation>,
}

/// Re-run [`evaluate`] over a history window, keeping only offending samples.
pub fn evaluate_history<'a>(
    history: impl IntoIterator<Item = &'a MetricSample>,
    thresholds: &ThresholdSet,
    custom: &[Arc<CustomMetricDefinition>],
) -> Vec<HistoricalViolation> {
    history
        .into_iter()
        .filter_map(|sample| {
            let violations = evaluate(sample, thresholds, custom);
            (!violations.is_empty()).then(|| HistoricalViolation {
                seq: sample.seq(),
                timestamp: sample.timestamp(),
                violations,
            })
        })
        .collect()
}

/// An alert before the monitor stamps it with an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub message: String,
    pub severity: Severity,
    pub violations: Vec<Violation>,
}

/// Group violations into alerts.
///
/// Built-in violations from one sample collapse into a single alert that
/// escalates to `Error` when more than one metric is out of bounds. Each
/// custom violation gets its own alert.
pub fn group_alerts(violations: Vec<Violation>) -> Vec<AlertDraft> {
    let (builtin, custom): (Vec<_>, Vec<_>) = violations
        .into_iter()
        .partition(|v| matches!(v.metric, MetricName::Builtin(_)));

    let mut drafts = Vec::with_capacity(custom.len() + 1);

    if !builtin.is_empty() {
        let escalated = builtin.len() > 1 || builtin.iter().any(|v| v.level == Severity::Error);
        let message = builtin
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        drafts.push(AlertDraft {
            message,
            severity: if escalated {
                Severity::Error
            } else {
                Severity::Warning
            },
            violations: builtin,
        });
    }

    drafts.extend(custom.into_iter().map(|v| AlertDraft {
        message: v.message.clone(),
        severity: v.level,
        violations: vec![v],
    }));

    drafts
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{BuiltinSample, Comparison, CustomSample, Limit};

    fn builtin(bandwidth: f64, latency: f64, reliability: f64) -> MetricSample {
        MetricSample::Builtin(BuiltinSample {
            seq: 0,
            timestamp: Utc::now(),
            bandwidth,
            latency,
            reliability,
        })
    }

    fn custom(values: &[(&str, f64)]) -> MetricSample {
        MetricSample::Custom(CustomSample {
            seq: 0,
            timestamp: Utc::now(),
            values: values
                .iter()
                .map(|(k, v)| ((*k).to_owned(), *v))
                .collect::<IndexMap<_, _>>(),
        })
    }

    fn custom1() -> Vec<Arc<CustomMetricDefinition>> {
        vec![Arc::new(CustomMetricDefinition::new(
            "custom1",
            Comparison::Above,
            Limit::new(50.0),
        ))]
    }

    #[test]
    fn single_builtin_violation_is_a_warning() {
        let violations = evaluate(&builtin(95.0, 50.0, 99.0), &ThresholdSet::default(), &[]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].metric, MetricName::Builtin(BuiltinMetric::Bandwidth));

        let alerts = group_alerts(violations);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
        insta::assert_snapshot!(alerts[0].message.as_str(), @"Bandwidth usage exceeded threshold");
    }

    #[test]
    fn two_builtin_violations_combine_into_one_error() {
        let violations = evaluate(&builtin(95.0, 130.0, 99.0), &ThresholdSet::default(), &[]);
        assert_eq!(violations.len(), 2);

        let alerts = group_alerts(violations);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Error);
        insta::assert_snapshot!(
            alerts[0].message.as_str(),
            @"Bandwidth usage exceeded threshold, Latency exceeded target"
        );
    }

    #[test]
    fn reliability_breaches_below_minimum() {
        let violations = evaluate(&builtin(10.0, 10.0, 94.0), &ThresholdSet::default(), &[]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "Reliability below minimum threshold");
    }

    #[test]
    fn clean_sample_has_no_violations() {
        let violations = evaluate(&builtin(50.0, 50.0, 99.0), &ThresholdSet::default(), &[]);
        assert!(violations.is_empty());
        assert!(group_alerts(violations).is_empty());
    }

    #[test]
    fn critical_crossing_escalates_single_metric() {
        let thresholds = ThresholdSet {
            bandwidth: Limit::tiered(80.0, 90.0),
            ..ThresholdSet::default()
        };
        let alerts = group_alerts(evaluate(&builtin(95.0, 10.0, 99.0), &thresholds, &[]));
        assert_eq!(alerts[0].severity, Severity::Error);
    }

    #[test]
    fn custom_metric_above_threshold_violates() {
        let violations = evaluate(
            &custom(&[("custom1", 60.0)]),
            &ThresholdSet::default(),
            &custom1(),
        );
        let alerts = group_alerts(violations);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert!(alerts[0].message.contains("custom1"));
        insta::assert_snapshot!(alerts[0].message.as_str(), @r#"Custom metric "custom1" > 50"#);
    }

    #[test]
    fn custom_metric_below_threshold_is_clean() {
        let violations = evaluate(
            &custom(&[("custom1", 40.0)]),
            &ThresholdSet::default(),
            &custom1(),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn missing_or_nan_custom_values_are_skipped() {
        let defs = custom1();
        assert!(evaluate(&custom(&[]), &ThresholdSet::default(), &defs).is_empty());
        assert!(
            evaluate(
                &custom(&[("custom1", f64::NAN)]),
                &ThresholdSet::default(),
                &defs
            )
            .is_empty()
        );
    }

    #[test]
    fn below_condition_uses_lower_direction() {
        let defs = vec![Arc::new(CustomMetricDefinition::new(
            "throughput",
            Comparison::Below,
            Limit::new(20.0),
        ))];
        let violations = evaluate(
            &custom(&[("throughput", 10.0)]),
            &ThresholdSet::default(),
            &defs,
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "Custom metric \"throughput\" < 20");
    }

    #[test]
    fn history_rederivation_keeps_only_offending_samples() {
        let history = [builtin(10.0, 10.0, 99.0), builtin(95.0, 10.0, 99.0)];
        let rows = evaluate_history(&history, &ThresholdSet::default(), &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].violations.len(), 1);
    }

    #[test]
    fn each_custom_violation_gets_its_own_alert() {
        let defs = vec![
            Arc::new(CustomMetricDefinition::new("a", Comparison::Above, Limit::new(1.0))),
            Arc::new(CustomMetricDefinition::new("b", Comparison::Above, Limit::new(1.0))),
        ];
        let alerts = group_alerts(evaluate(
            &custom(&[("a", 5.0), ("b", 5.0)]),
            &ThresholdSet::default(),
            &defs,
        ));
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.severity == Severity::Warning));
    }
}
