// ── Sample feed ──
//
// Turns history snapshots into a feed of individual samples, so consumers
// see each tick once instead of diffing whole windows themselves.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::MetricSample;

type Snapshot = Arc<Vec<Arc<MetricSample>>>;

/// Yields every sample appended to the history after subscription, in
/// `seq` order.
///
/// Samples already retained when the stream was created are skipped. If
/// several ticks land between polls, all of them that are still retained
/// are yielded; samples evicted before the consumer looked are lost and
/// counted in [`missed()`](Self::missed).
pub struct SampleStream {
    changes: WatchStream<Snapshot>,
    pending: VecDeque<Arc<MetricSample>>,
    last_seq: u64,
    missed: u64,
}

impl SampleStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let last_seq = receiver.borrow().last().map_or(0, |s| s.seq());
        Self {
            changes: WatchStream::from_changes(receiver),
            pending: VecDeque::new(),
            last_seq,
            missed: 0,
        }
    }

    /// Samples that were evicted from the history before this stream saw them.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    fn absorb(&mut self, snapshot: &[Arc<MetricSample>]) {
        let fresh: Vec<_> = snapshot
            .iter()
            .filter(|s| s.seq() > self.last_seq)
            .cloned()
            .collect();
        let Some(first) = fresh.first() else {
            return;
        };

        // Seqs are contiguous across both tick kinds, so a gap means eviction.
        self.missed += first.seq().saturating_sub(self.last_seq + 1);
        self.last_seq = fresh.last().map_or(self.last_seq, |s| s.seq());
        self.pending.extend(fresh);
    }
}

impl Stream for SampleStream {
    type Item = Arc<MetricSample>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(sample) = this.pending.pop_front() {
                return Poll::Ready(Some(sample));
            }
            match Pin::new(&mut this.changes).poll_next(cx) {
                Poll::Ready(Some(snapshot)) => this.absorb(&snapshot),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::BuiltinSample;

    fn sample(seq: u64) -> Arc<MetricSample> {
        Arc::new(MetricSample::Builtin(BuiltinSample {
            seq,
            timestamp: Utc::now(),
            bandwidth: 1.0,
            latency: 1.0,
            reliability: 99.0,
        }))
    }

    fn stream_over(initial: &[u64]) -> SampleStream {
        let (_tx, rx) = watch::channel(Arc::new(initial.iter().map(|s| sample(*s)).collect()));
        SampleStream::new(rx)
    }

    fn pending_seqs(stream: &SampleStream) -> Vec<u64> {
        stream.pending.iter().map(|s| s.seq()).collect()
    }

    #[test]
    fn starts_after_retained_samples() {
        let mut stream = stream_over(&[1, 2, 3]);
        stream.absorb(&[sample(2), sample(3), sample(4), sample(5)]);
        assert_eq!(pending_seqs(&stream), [4, 5]);
        assert_eq!(stream.missed(), 0);
    }

    #[test]
    fn eviction_gap_is_counted() {
        let mut stream = stream_over(&[1]);
        stream.absorb(&[sample(4), sample(5)]);
        assert_eq!(pending_seqs(&stream), [4, 5]);
        assert_eq!(stream.missed(), 2);
    }

    #[test]
    fn unchanged_snapshot_yields_nothing() {
        let mut stream = stream_over(&[1, 2]);
        stream.absorb(&[sample(1), sample(2)]);
        assert!(stream.pending.is_empty());
    }
}
