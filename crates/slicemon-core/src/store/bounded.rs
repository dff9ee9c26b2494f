// ── Generic bounded snapshot log ──
//
// A capacity-capped sequence whose current contents live inside a `watch`
// channel. Readers get cheap `Arc` snapshots; every mutation republishes.

use std::sync::Arc;

use tokio::sync::watch;

/// Which end overflow is trimmed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trim {
    /// Oldest entries sit at the front (append order).
    Front,
    /// Oldest entries sit at the back (most-recent-first order).
    Back,
}

pub(crate) struct BoundedLog<T: Send + Sync + 'static> {
    capacity: usize,
    trim: Trim,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Send + Sync + 'static> BoundedLog<T> {
    pub(crate) fn new(capacity: usize, trim: Trim) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            capacity,
            trim,
            snapshot,
        }
    }

    /// Insert at the "newest" end and trim overflow from the "oldest" end.
    /// Returns how many entries were evicted.
    pub(crate) fn push(&self, item: impl Into<Arc<T>>) -> usize {
        let item = item.into();
        let capacity = self.capacity;
        let trim = self.trim;
        let mut evicted = 0;

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let items = Arc::make_mut(snap);
            match trim {
                Trim::Front => {
                    items.push(item);
                    if items.len() > capacity {
                        evicted = items.len() - capacity;
                        items.drain(..evicted);
                    }
                }
                Trim::Back => {
                    items.insert(0, item);
                    if items.len() > capacity {
                        evicted = items.len() - capacity;
                        items.truncate(capacity);
                    }
                }
            }
        });

        evicted
    }

    /// Remove every entry matching `pred`. Subscribers are only notified
    /// when something was actually removed.
    pub(crate) fn remove_where(&self, pred: impl Fn(&T) -> bool) -> usize {
        let mut removed = 0;
        self.snapshot.send_if_modified(|snap| {
            if !snap.iter().any(|item| pred(&**item)) {
                return false;
            }
            let items = Arc::make_mut(snap);
            let before = items.len();
            items.retain(|item| !pred(&**item));
            removed = before - items.len();
            true
        });
        removed
    }

    pub(crate) fn clear(&self) {
        self.snapshot.send_if_modified(|snap| {
            if snap.is_empty() {
                return false;
            }
            *snap = Arc::new(Vec::new());
            true
        });
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }
}
