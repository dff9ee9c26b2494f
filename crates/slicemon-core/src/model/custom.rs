// ── User-defined metrics ──

use serde::{Deserialize, Serialize};

use super::threshold::{Comparison, Limit};

/// A custom metric sampled on its own tick and checked against its own limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomMetricDefinition {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    /// Free-form expression kept for display. Not evaluated.
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub condition: Comparison,
    #[serde(default = "default_threshold")]
    pub threshold: Limit,
}

fn default_threshold() -> Limit {
    Limit::tiered(80.0, 90.0)
}

impl CustomMetricDefinition {
    pub fn new(name: impl Into<String>, condition: Comparison, threshold: Limit) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
            formula: String::new(),
            condition,
            threshold,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = formula.into();
        self
    }
}
