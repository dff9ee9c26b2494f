// ── Metric sampling ──
//
// `MetricSource` is the seam between the monitor and wherever telemetry
// comes from. `SimulatedSource` stands in for a real slice telemetry feed.

use std::sync::Arc;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{BuiltinReading, CustomMetricDefinition};

pub const BANDWIDTH_RANGE: std::ops::Range<f64> = 0.0..100.0;
pub const LATENCY_RANGE: std::ops::Range<f64> = 0.0..150.0;
pub const RELIABILITY_RANGE: std::ops::Range<f64> = 90.0..100.0;
pub const CUSTOM_RANGE: std::ops::Range<f64> = 0.0..100.0;

/// Produces raw metric values for the monitor's ticks.
///
/// Implementations must not block: both ticks call into the source while
/// holding the monitor's source lock.
pub trait MetricSource: Send + 'static {
    /// Read the three built-in metrics.
    fn builtin(&mut self) -> BuiltinReading;

    /// Read a value for each defined custom metric, keyed by name.
    ///
    /// Metrics the source cannot produce may be left out; the evaluator
    /// treats a missing value as "no violation".
    fn custom(&mut self, definitions: &[Arc<CustomMetricDefinition>]) -> IndexMap<String, f64>;
}

/// Uniform pseudo-random telemetry.
pub struct SimulatedSource {
    rng: StdRng,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic source for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSource for SimulatedSource {
    fn builtin(&mut self) -> BuiltinReading {
        BuiltinReading {
            bandwidth: self.rng.gen_range(BANDWIDTH_RANGE),
            latency: self.rng.gen_range(LATENCY_RANGE),
            reliability: self.rng.gen_range(RELIABILITY_RANGE),
        }
    }

    fn custom(&mut self, definitions: &[Arc<CustomMetricDefinition>]) -> IndexMap<String, f64> {
        definitions
            .iter()
            .map(|def| (def.name.clone(), self.rng.gen_range(CUSTOM_RANGE)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comparison, Limit};

    #[test]
    fn builtin_values_stay_in_range() {
        let mut source = SimulatedSource::seeded(7);
        for _ in 0..10_000 {
            let r = source.builtin();
            assert!(BANDWIDTH_RANGE.contains(&r.bandwidth), "bandwidth {}", r.bandwidth);
            assert!(LATENCY_RANGE.contains(&r.latency), "latency {}", r.latency);
            assert!(RELIABILITY_RANGE.contains(&r.reliability), "reliability {}", r.reliability);
        }
    }

    #[test]
    fn custom_values_follow_definition_order() {
        let defs = vec![
            Arc::new(CustomMetricDefinition::new("jitter", Comparison::Above, Limit::new(50.0))),
            Arc::new(CustomMetricDefinition::new("loss", Comparison::Above, Limit::new(5.0))),
        ];
        let values = SimulatedSource::seeded(1).custom(&defs);
        let names: Vec<&str> = values.keys().map(String::as_str).collect();
        assert_eq!(names, ["jitter", "loss"]);
        assert!(values.values().all(|v| CUSTOM_RANGE.contains(v)));
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        let a = SimulatedSource::seeded(42).builtin();
        let b = SimulatedSource::seeded(42).builtin();
        assert_eq!(a, b);
    }
}
