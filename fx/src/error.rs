//! Exchange-rate error types.

use tender_common::MonetaryError;
use thiserror::Error;

/// Errors that can occur while building or applying exchange rates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    /// A required builder field was never set.
    #[error("Incomplete exchange rate: {field} is not set")]
    IncompleteRate { field: &'static str },

    /// Consecutive links of a rate chain do not connect.
    #[error("Invalid rate chain at link {index}: {reason}")]
    InvalidChain { index: usize, reason: String },

    /// Amount currency does not match the rate's base currency.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Arithmetic failure while deriving or applying a rate.
    #[error(transparent)]
    Monetary(#[from] MonetaryError),
}

impl FxError {
    /// Stable identifier for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::IncompleteRate { .. } => "INCOMPLETE_RATE",
            FxError::InvalidChain { .. } => "INVALID_CHAIN",
            FxError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            FxError::Monetary(inner) => inner.error_code(),
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
