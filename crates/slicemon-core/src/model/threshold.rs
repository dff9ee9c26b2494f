// ── Threshold configuration ──
//
// A `Limit` is a warning bound with an optional stricter critical bound.
// Config files may give a bare number, which is read as a warning-only limit.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::alert::Severity;
use super::metric::BuiltinMetric;

/// Which side of a limit counts as a breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Values above the limit breach it.
    Upper,
    /// Values below the limit breach it.
    Lower,
}

/// Comparison operator attached to a custom metric.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
pub enum Comparison {
    #[default]
    #[serde(rename = ">", alias = "above")]
    #[strum(to_string = ">", serialize = "above")]
    Above,
    #[serde(rename = "<", alias = "below")]
    #[strum(to_string = "<", serialize = "below")]
    Below,
}

impl Comparison {
    pub fn direction(self) -> Direction {
        match self {
            Self::Above => Direction::Upper,
            Self::Below => Direction::Lower,
        }
    }
}

// ── Limit ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum LimitRepr {
    Single(f64),
    Tiered {
        warning: f64,
        #[serde(default)]
        critical: Option<f64>,
    },
}

impl From<LimitRepr> for Limit {
    fn from(repr: LimitRepr) -> Self {
        match repr {
            LimitRepr::Single(warning) => Self::new(warning),
            LimitRepr::Tiered { warning, critical } => Self { warning, critical },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "LimitRepr")]
pub struct Limit {
    pub warning: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,
}

impl Limit {
    pub const fn new(warning: f64) -> Self {
        Self {
            warning,
            critical: None,
        }
    }

    pub const fn tiered(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical: Some(critical),
        }
    }

    /// Classify `value` against this limit.
    ///
    /// Non-finite values never breach.
    pub fn breach(&self, value: f64, direction: Direction) -> Option<Severity> {
        if !value.is_finite() {
            return None;
        }
        let crosses = |bound: f64| match direction {
            Direction::Upper => value > bound,
            Direction::Lower => value < bound,
        };
        if !crosses(self.warning) {
            return None;
        }
        if self.critical.is_some_and(crosses) {
            Some(Severity::Error)
        } else {
            Some(Severity::Warning)
        }
    }

    /// Check that the bounds are finite and the critical bound is not looser
    /// than the warning bound.
    pub fn validate(&self, direction: Direction) -> Result<(), String> {
        if !self.warning.is_finite() {
            return Err(format!("warning limit must be finite, got {}", self.warning));
        }
        let Some(critical) = self.critical else {
            return Ok(());
        };
        if !critical.is_finite() {
            return Err(format!("critical limit must be finite, got {critical}"));
        }
        let looser = match direction {
            Direction::Upper => critical < self.warning,
            Direction::Lower => critical > self.warning,
        };
        if looser {
            return Err(format!(
                "critical limit {critical} is looser than warning limit {}",
                self.warning
            ));
        }
        Ok(())
    }
}

// ── ThresholdSet ────────────────────────────────────────────────────

/// Active limits for the built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSet {
    /// Percent of allocated bandwidth.
    pub bandwidth: Limit,
    /// Percent of the latency target.
    pub latency: Limit,
    /// Minimum delivery percent.
    pub reliability: Limit,
}

impl ThresholdSet {
    pub fn limit(&self, metric: BuiltinMetric) -> &Limit {
        match metric {
            BuiltinMetric::Bandwidth => &self.bandwidth,
            BuiltinMetric::Latency => &self.latency,
            BuiltinMetric::Reliability => &self.reliability,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for metric in BuiltinMetric::ALL {
            self.limit(metric)
                .validate(metric.direction())
                .map_err(|reason| format!("{metric}: {reason}"))?;
        }
        Ok(())
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            bandwidth: Limit::new(80.0),
            latency: Limit::new(120.0),
            reliability: Limit::new(95.0),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upper_limit_is_strict() {
        let limit = Limit::new(80.0);
        assert_eq!(limit.breach(80.0, Direction::Upper), None);
        assert_eq!(limit.breach(80.1, Direction::Upper), Some(Severity::Warning));
    }

    #[test]
    fn lower_limit_breaches_below() {
        let limit = Limit::tiered(95.0, 92.0);
        assert_eq!(limit.breach(96.0, Direction::Lower), None);
        assert_eq!(limit.breach(94.0, Direction::Lower), Some(Severity::Warning));
        assert_eq!(limit.breach(91.0, Direction::Lower), Some(Severity::Error));
    }

    #[test]
    fn non_finite_values_never_breach() {
        let limit = Limit::new(0.0);
        assert_eq!(limit.breach(f64::NAN, Direction::Upper), None);
        assert_eq!(limit.breach(f64::INFINITY, Direction::Upper), None);
    }

    #[test]
    fn validate_rejects_looser_critical() {
        assert!(Limit::tiered(80.0, 70.0).validate(Direction::Upper).is_err());
        assert!(Limit::tiered(95.0, 97.0).validate(Direction::Lower).is_err());
        assert!(Limit::tiered(80.0, 90.0).validate(Direction::Upper).is_ok());
    }

    #[test]
    fn limit_deserializes_from_number_or_table() {
        let bare: Limit = serde_json::from_str("80").unwrap();
        assert_eq!(bare, Limit::new(80.0));

        let tiered: Limit = serde_json::from_str(r#"{"warning": 80, "critical": 90}"#).unwrap();
        assert_eq!(tiered, Limit::tiered(80.0, 90.0));
    }

    #[test]
    fn comparison_accepts_symbols_and_words() {
        assert_eq!(">".parse::<Comparison>().unwrap(), Comparison::Above);
        assert_eq!("below".parse::<Comparison>().unwrap(), Comparison::Below);
        assert_eq!(Comparison::Below.to_string(), "<");
    }
}
