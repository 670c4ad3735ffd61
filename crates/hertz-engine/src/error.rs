use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by estimation and classification.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HertzError {
    /// Rejected constructor or environment input. Not retried.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Classification was asked about a rate that cannot come from a sane
    /// measurement (zero, negative, or non-finite).
    #[error("sample rate must be a finite value greater than zero, got {fps}")]
    InvalidSampleRate { fps: f64 },

    /// The measured rate is below the lowest known bucket.
    #[error("no hz defined for {fps}fps")]
    NoMatchingBucket { fps: f64 },

    /// No estimate became available within the time budget.
    #[error("monitoring took too long (no estimate within {timeout:?})")]
    MonitoringTimedOut { timeout: Duration },

    /// A query is already in flight on this estimator.
    #[error("a refresh-rate measurement is already running on this estimator")]
    AlreadyMonitoring,
}

impl HertzError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }
}
