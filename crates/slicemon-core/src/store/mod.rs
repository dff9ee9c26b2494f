// ── Bounded reactive stores ──
//
// Capacity-capped sample history and alert list with push-based change
// notification.

mod alerts;
mod bounded;
mod history;

pub use alerts::{AlertSink, DEFAULT_ALERT_CAPACITY};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryBuffer};
