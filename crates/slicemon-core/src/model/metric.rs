// ── Metric identity and samples ──

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::threshold::Direction;

// ── BuiltinMetric ───────────────────────────────────────────────────

/// The three QoS metrics every slice reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BuiltinMetric {
    /// Share of allocated bandwidth in use, percent.
    Bandwidth,
    /// Latency as a percentage of the slice's latency target.
    Latency,
    /// Delivery success rate, percent.
    Reliability,
}

impl BuiltinMetric {
    pub const ALL: [Self; 3] = [Self::Bandwidth, Self::Latency, Self::Reliability];

    /// Which side of the limit counts as a breach.
    pub fn direction(self) -> Direction {
        match self {
            Self::Bandwidth | Self::Latency => Direction::Upper,
            Self::Reliability => Direction::Lower,
        }
    }

    /// Operator-facing text used when this metric breaches its limit.
    pub fn violation_message(self) -> &'static str {
        match self {
            Self::Bandwidth => "Bandwidth usage exceeded threshold",
            Self::Latency => "Latency exceeded target",
            Self::Reliability => "Reliability below minimum threshold",
        }
    }
}

// ── MetricName ──────────────────────────────────────────────────────

/// Names either a built-in metric or a user-defined custom metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricName {
    Builtin(BuiltinMetric),
    Custom(String),
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(m) => write!(f, "{m}"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

impl From<BuiltinMetric> for MetricName {
    fn from(m: BuiltinMetric) -> Self {
        Self::Builtin(m)
    }
}

impl From<&str> for MetricName {
    fn from(s: &str) -> Self {
        s.parse::<BuiltinMetric>()
            .map_or_else(|_| Self::Custom(s.to_owned()), Self::Builtin)
    }
}

// ── Samples ─────────────────────────────────────────────────────────

/// Raw built-in values as produced by a metric source, before stamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinReading {
    pub bandwidth: f64,
    pub latency: f64,
    pub reliability: f64,
}

/// One tick of the built-in metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltinSample {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub bandwidth: f64,
    pub latency: f64,
    pub reliability: f64,
}

impl BuiltinSample {
    pub fn value(&self, metric: BuiltinMetric) -> f64 {
        match metric {
            BuiltinMetric::Bandwidth => self.bandwidth,
            BuiltinMetric::Latency => self.latency,
            BuiltinMetric::Reliability => self.reliability,
        }
    }
}

/// One tick of the custom metrics defined at sampling time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSample {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub values: IndexMap<String, f64>,
}

/// A timestamped, immutable telemetry record held in the history buffer.
///
/// Built-in and custom ticks are scheduled independently, so the history
/// interleaves both kinds. `seq` orders them across kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricSample {
    Builtin(BuiltinSample),
    Custom(CustomSample),
}

impl MetricSample {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Builtin(s) => s.seq,
            Self::Custom(s) => s.seq,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Builtin(s) => s.timestamp,
            Self::Custom(s) => s.timestamp,
        }
    }

    /// Look up a metric value. `None` when the sample does not carry it.
    pub fn value(&self, name: &MetricName) -> Option<f64> {
        match (self, name) {
            (Self::Builtin(s), MetricName::Builtin(m)) => Some(s.value(*m)),
            (Self::Custom(s), MetricName::Custom(n)) => s.values.get(n).copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_name_parses_builtins_case_insensitively() {
        assert_eq!(
            MetricName::from("Latency"),
            MetricName::Builtin(BuiltinMetric::Latency)
        );
        assert_eq!(MetricName::from("jitter"), MetricName::Custom("jitter".into()));
    }

    #[test]
    fn value_lookup_respects_sample_kind() {
        let sample = MetricSample::Builtin(BuiltinSample {
            seq: 1,
            timestamp: Utc::now(),
            bandwidth: 10.0,
            latency: 20.0,
            reliability: 99.0,
        });
        assert_eq!(sample.value(&BuiltinMetric::Latency.into()), Some(20.0));
        assert_eq!(sample.value(&MetricName::Custom("jitter".into())), None);
    }
}
