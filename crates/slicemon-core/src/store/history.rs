// ── Sample history ──

use std::sync::Arc;

use super::bounded::{BoundedLog, Trim};
use crate::model::MetricSample;
use crate::stream::SampleStream;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Trailing window of samples in append order. Overflow drops the oldest.
pub struct HistoryBuffer {
    log: BoundedLog<MetricSample>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: BoundedLog::new(capacity, Trim::Front),
        }
    }

    /// Append a sample. Returns how many old samples were evicted.
    pub fn append(&self, sample: MetricSample) -> usize {
        self.log.push(sample)
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<MetricSample>>> {
        self.log.snapshot()
    }

    /// Feed of samples appended from now on.
    pub fn subscribe(&self) -> SampleStream {
        SampleStream::new(self.log.subscribe())
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
