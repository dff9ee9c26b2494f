//! QoS threshold monitoring for network slices.
//!
//! This crate owns the monitoring loop and its domain model:
//!
//! - **[`Monitor`]**: Lifecycle facade. [`start()`](Monitor::start) arms two
//!   independent periodic ticks (built-in metrics and custom metrics) as
//!   cancellable tokio tasks; [`stop()`](Monitor::stop) disarms them. Setters
//!   for thresholds, the auto-alert gate, and custom metrics take effect on
//!   the next tick.
//!
//! - **[`evaluate()`]**: The single pure threshold check, shared by the live
//!   ticks and by [`Monitor::violations()`] over retained history.
//!
//! - **[`HistoryBuffer`] / [`AlertSink`]**: Capacity-capped stores backed by
//!   `tokio::sync::watch`. [`SampleStream`] turns history changes into a
//!   feed of individual samples.
//!
//! - **[`MetricSource`]**: Seam for telemetry. [`SimulatedSource`] produces
//!   uniform pseudo-random values.
//!
//! - **[`SettingsStore`]**: Injected key-value persistence for thresholds,
//!   custom metrics, and action rules.

pub mod config;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod monitor;
pub mod sampler;
pub mod settings;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::MonitorConfig;
pub use error::CoreError;
pub use evaluate::{AlertDraft, HistoricalViolation, evaluate, evaluate_history, group_alerts};
pub use monitor::{Monitor, MonitorState};
pub use sampler::{MetricSource, SimulatedSource};
pub use settings::{JsonFileStore, MemoryStore, MonitorSettings, SettingsStore};
pub use store::{AlertSink, HistoryBuffer};
pub use stream::SampleStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ActionCondition, ActionKind, Alert, AlertId, AutomatedActionRule, BuiltinMetric,
    BuiltinReading, BuiltinSample, Comparison, CustomMetricDefinition, CustomSample, Direction,
    Limit, MetricName, MetricSample, Severity, ThresholdSet, Violation,
};
