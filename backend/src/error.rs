//! Crate-level error type.
//!
//! Three failure kinds drive scan behaviour:
//!
//! - [`AlignmentError::Domain`]: invalid configuration or input; aborts the scan.
//! - [`AlignmentError::DataUnavailable`]: the ephemeris collaborator could not
//!   produce a value for one body/date after retries; the affected date is
//!   skipped and reported, the scan continues.
//! - [`AlignmentError::ModelInconsistency`]: orbital constants that cannot yield
//!   a positive mean motion; fatal at startup.

use chrono::NaiveDate;

use crate::ephemeris::EphemerisError;

/// Result type for alignment operations
pub type AlignmentResult<T> = Result<T, AlignmentError>;

#[derive(Debug, thiserror::Error)]
pub enum AlignmentError {
    /// Invalid input (fewer than 2 bodies, threshold <= 0, start > end, ...).
    #[error("Domain error: {0}")]
    Domain(String),

    /// Collaborator failed for a body/date after retries.
    #[error("Data unavailable for {body} on {date}: {source}")]
    DataUnavailable {
        date: NaiveDate,
        body: String,
        #[source]
        source: EphemerisError,
    },

    /// Orbital constants produce a non-positive or non-finite mean motion.
    #[error("Model inconsistency: {0}")]
    ModelInconsistency(String),

    /// Configuration file or environment could not be read.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Fatal collaborator failure outside the per-date scan loop.
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}

impl AlignmentError {
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::ModelInconsistency(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether the scan may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}
