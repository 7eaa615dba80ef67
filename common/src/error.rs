//! Error types for monetary arithmetic.

use crate::amount::AmountKind;
use thiserror::Error;

/// Errors raised by currency lookup, amount arithmetic and rounding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonetaryError {
    /// A required input was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operands carry different currencies.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    /// Division, remainder or reciprocal against zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// The result does not fit the representation.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// The value cannot be projected onto the requested numeric type.
    #[error("Unsupported conversion of {value} to {target}")]
    UnsupportedConversion { value: String, target: &'static str },

    /// Rounding mode `Unnecessary` was asked to drop non-zero digits.
    #[error("Rounding necessary: {0} is not exact at the requested precision")]
    RoundingNecessary(String),

    /// An operator or conversion produced a different amount representation.
    #[error("Unexpected amount representation: expected {expected}, got {actual}")]
    UnexpectedVariant {
        expected: AmountKind,
        actual: AmountKind,
    },

    /// Currency code is not known to the registry.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

impl MonetaryError {
    /// Stable identifier for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            MonetaryError::InvalidArgument(_) => "INVALID_ARGUMENT",
            MonetaryError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            MonetaryError::DivisionByZero => "DIVISION_BY_ZERO",
            MonetaryError::ArithmeticOverflow(_) => "ARITHMETIC_OVERFLOW",
            MonetaryError::UnsupportedConversion { .. } => "UNSUPPORTED_CONVERSION",
            MonetaryError::RoundingNecessary(_) => "ROUNDING_NECESSARY",
            MonetaryError::UnexpectedVariant { .. } => "UNEXPECTED_VARIANT",
            MonetaryError::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
        }
    }

    pub(crate) fn mismatch(expected: &str, actual: &str) -> Self {
        MonetaryError::CurrencyMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn overflow(what: impl std::fmt::Display) -> Self {
        MonetaryError::ArithmeticOverflow(what.to_string())
    }
}

/// Result type alias for monetary operations.
pub type MonetaryResult<T> = std::result::Result<T, MonetaryError>;
