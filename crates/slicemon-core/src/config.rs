// ── Runtime monitor configuration ──
//
// Describes *how* a monitor runs. Built by the CLI (via slicemon-config)
// or by embedding code and handed to `Monitor::new`; core never reads
// config files.

use std::time::Duration;

use crate::error::CoreError;
use crate::model::{AutomatedActionRule, CustomMetricDefinition, ThresholdSet};
use crate::store::{DEFAULT_ALERT_CAPACITY, DEFAULT_HISTORY_CAPACITY};

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Period of the built-in metrics tick.
    pub sample_interval: Duration,
    /// Period of the custom metrics tick.
    pub custom_interval: Duration,
    /// Samples retained in the history buffer.
    pub history_capacity: usize,
    /// Alerts retained in the alert sink.
    pub alert_capacity: usize,
    /// Whether the evaluator raises alerts at startup.
    pub auto_alert: bool,
    pub thresholds: ThresholdSet,
    pub custom_metrics: Vec<CustomMetricDefinition>,
    pub action_rules: Vec<AutomatedActionRule>,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sample_interval.is_zero() || self.custom_interval.is_zero() {
            return Err(CoreError::validation("tick intervals must be non-zero"));
        }
        if self.history_capacity == 0 || self.alert_capacity == 0 {
            return Err(CoreError::validation("store capacities must be non-zero"));
        }
        self.thresholds.validate().map_err(CoreError::validation)?;
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            custom_interval: DEFAULT_SAMPLE_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            auto_alert: true,
            thresholds: ThresholdSet::default(),
            custom_metrics: Vec::new(),
            action_rules: Vec::new(),
        }
    }
}
