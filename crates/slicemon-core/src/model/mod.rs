// ── Domain model ──
//
// Canonical types shared by the sampler, evaluator, stores, and consumers.

pub mod action;
pub mod alert;
pub mod custom;
pub mod metric;
pub mod threshold;

pub use action::{ActionCondition, ActionKind, AutomatedActionRule};
pub use alert::{Alert, AlertId, Severity, Violation};
pub use custom::CustomMetricDefinition;
pub use metric::{
    BuiltinMetric, BuiltinReading, BuiltinSample, CustomSample, MetricName, MetricSample,
};
pub use threshold::{Comparison, Direction, Limit, ThresholdSet};
