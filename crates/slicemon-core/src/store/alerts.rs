// ── Alert sink ──

use std::sync::Arc;

use tokio::sync::watch;

use super::bounded::{BoundedLog, Trim};
use crate::model::{Alert, AlertId};

pub const DEFAULT_ALERT_CAPACITY: usize = 10;

/// Most-recent-first alert list. Overflow silently drops the oldest alert.
pub struct AlertSink {
    log: BoundedLog<Alert>,
}

impl AlertSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: BoundedLog::new(capacity, Trim::Back),
        }
    }

    /// Prepend an alert and return the shared handle that was stored.
    pub fn push(&self, alert: Alert) -> Arc<Alert> {
        let alert = Arc::new(alert);
        self.log.push(Arc::clone(&alert));
        alert
    }

    /// Remove the alert with `id`. Returns `false` (and changes nothing) if
    /// no such alert is present.
    pub fn dismiss(&self, id: AlertId) -> bool {
        self.log.remove_where(|a| a.id == id) > 0
    }

    pub fn clear(&self) {
        self.log.clear();
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<Alert>>> {
        self.log.snapshot()
    }

    /// Watch the alert list; every push, dismissal, or clear publishes a
    /// new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Alert>>>> {
        self.log.subscribe()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AlertSink {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_CAPACITY)
    }
}
