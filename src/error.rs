//! Error taxonomy for the pricing pipeline
//!
//! Only malformed configuration and malformed applicant data are errors.
//! A missing model artifact is recovered locally and reported as a
//! [`MissingModelWarning`](crate::models::MissingModelWarning) instead.

use thiserror::Error;

/// Errors surfaced by engine construction and pricing requests
#[derive(Debug, Error)]
pub enum PricingError {
    /// Malformed or out-of-range configuration, raised at construction time
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A pricing request field failed validation
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    /// A customer data row could not be parsed
    #[error("invalid record at row {row}: {reason}")]
    InvalidRecord { row: u64, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PricingError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        PricingError::Configuration(reason.into())
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PricingError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the request rather than the engine setup
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PricingError::InvalidInput { .. } | PricingError::InvalidRecord { .. }
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PricingError>;
