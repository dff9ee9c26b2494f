// ── Core error types ──
//
// Errors surfaced by slicemon-core. Sampling and threshold evaluation are
// infallible; these cover configuration input, lifecycle misuse, and the
// settings persistence seam.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Custom metric already defined: {name}")]
    DuplicateMetric { name: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Monitor is already running")]
    AlreadyRunning,

    // ── Persistence errors ───────────────────────────────────────────
    #[error("Settings store error: {message}")]
    Storage { message: String },

    #[error("Settings serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}
