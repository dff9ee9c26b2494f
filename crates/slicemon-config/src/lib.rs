//! Configuration for the slicemon CLI.
//!
//! TOML file + `SLICEMON_` environment overrides, validation with
//! field-level errors, and translation to `slicemon_core::MonitorConfig`.
//! The CLI layers its `GlobalOpts` on top of what is loaded here.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use slicemon_core::config::DEFAULT_SAMPLE_INTERVAL;
use slicemon_core::store::{DEFAULT_ALERT_CAPACITY, DEFAULT_HISTORY_CAPACITY};
use slicemon_core::{
    AutomatedActionRule, BuiltinMetric, CustomMetricDefinition, MonitorConfig, ThresholdSet,
};

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `SLICEMON_THRESHOLDS__BANDWIDTH=90`.
pub const ENV_PREFIX: &str = "SLICEMON_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Tick periods, store capacities, and the alert gate.
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Built-in metric limits.
    #[serde(default)]
    pub thresholds: ThresholdSet,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_metrics: Vec<CustomMetricDefinition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_rules: Vec<AutomatedActionRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorSection {
    pub sample_interval_ms: u64,
    pub custom_interval_ms: u64,
    pub history_capacity: usize,
    pub alert_capacity: usize,
    pub auto_alert: bool,
}

impl Default for MonitorSection {
    fn default() -> Self {
        let interval_ms = u64::try_from(DEFAULT_SAMPLE_INTERVAL.as_millis()).unwrap_or(5000);
        Self {
            sample_interval_ms: interval_ms,
            custom_interval_ms: interval_ms,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            auto_alert: true,
        }
    }
}

// ── Validation and translation ──────────────────────────────────────

impl Config {
    /// Check every section, reporting the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let monitor = &self.monitor;
        if monitor.sample_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "monitor.sample_interval_ms",
                "must be greater than zero",
            ));
        }
        if monitor.custom_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "monitor.custom_interval_ms",
                "must be greater than zero",
            ));
        }
        if monitor.history_capacity == 0 {
            return Err(ConfigError::invalid(
                "monitor.history_capacity",
                "must be greater than zero",
            ));
        }
        if monitor.alert_capacity == 0 {
            return Err(ConfigError::invalid(
                "monitor.alert_capacity",
                "must be greater than zero",
            ));
        }

        for metric in BuiltinMetric::ALL {
            self.thresholds
                .limit(metric)
                .validate(metric.direction())
                .map_err(|reason| ConfigError::invalid(format!("thresholds.{metric}"), reason))?;
        }

        let mut seen = HashSet::new();
        for (i, def) in self.custom_metrics.iter().enumerate() {
            let field = format!("custom_metrics[{i}]");
            let name = def.name.trim();
            if name.is_empty() {
                return Err(ConfigError::invalid(
                    format!("{field}.name"),
                    "must not be empty",
                ));
            }
            if name.parse::<BuiltinMetric>().is_ok() {
                return Err(ConfigError::invalid(
                    format!("{field}.name"),
                    format!("'{name}' shadows a built-in metric"),
                ));
            }
            if !seen.insert(def.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("{field}.name"),
                    format!("'{name}' is defined more than once"),
                ));
            }
            def.threshold
                .validate(def.condition.direction())
                .map_err(|reason| ConfigError::invalid(format!("{field}.threshold"), reason))?;
        }

        for (i, rule) in self.action_rules.iter().enumerate() {
            if rule.metric.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("action_rules[{i}].metric"),
                    "must not be empty",
                ));
            }
            if !rule.threshold.is_finite() {
                return Err(ConfigError::invalid(
                    format!("action_rules[{i}].threshold"),
                    "must be finite",
                ));
            }
        }

        Ok(())
    }

    /// Build the runtime monitor configuration.
    pub fn to_monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        self.validate()?;
        Ok(MonitorConfig {
            sample_interval: Duration::from_millis(self.monitor.sample_interval_ms),
            custom_interval: Duration::from_millis(self.monitor.custom_interval_ms),
            history_capacity: self.monitor.history_capacity,
            alert_capacity: self.monitor.alert_capacity,
            auto_alert: self.monitor.auto_alert,
            thresholds: self.thresholds,
            custom_metrics: self.custom_metrics.clone(),
            action_rules: self.action_rules.clone(),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "slicemon", "slicemon").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("slicemon");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered sources: built-in defaults, then the TOML file, then env.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load and validate the Config at `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    cfg.validate()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
