//! Rounding modes and precision contexts.
//!
//! [`RoundingMode`] mirrors the eight classic decimal rounding modes and maps
//! each onto a [`RoundingStrategy`] of the decimal kernel. [`MathContext`]
//! pairs a significant-digit precision with a mode; it bounds every
//! operation whose exact result could be non-terminating.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MonetaryError, MonetaryResult};

/// Maximum number of significant digits the decimal kernel can hold.
pub const MAX_PRECISION: u32 = 28;

/// How discarded digits influence the retained ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Towards zero.
    Down,
    /// Towards positive infinity.
    Ceiling,
    /// Towards negative infinity.
    Floor,
    /// Nearest neighbour, ties away from zero.
    HalfUp,
    /// Nearest neighbour, ties towards zero.
    HalfDown,
    /// Nearest neighbour, ties to the even neighbour.
    HalfEven,
    /// Exact results only; any discarded non-zero digit is an error.
    Unnecessary,
}

impl RoundingMode {
    /// All modes, in declaration order.
    pub const ALL: [RoundingMode; 8] = [
        RoundingMode::Up,
        RoundingMode::Down,
        RoundingMode::Ceiling,
        RoundingMode::Floor,
        RoundingMode::HalfUp,
        RoundingMode::HalfDown,
        RoundingMode::HalfEven,
        RoundingMode::Unnecessary,
    ];

    /// The kernel strategy for this mode. `None` for `Unnecessary`.
    pub fn strategy(&self) -> Option<RoundingStrategy> {
        match self {
            RoundingMode::Up => Some(RoundingStrategy::AwayFromZero),
            RoundingMode::Down => Some(RoundingStrategy::ToZero),
            RoundingMode::Ceiling => Some(RoundingStrategy::ToPositiveInfinity),
            RoundingMode::Floor => Some(RoundingStrategy::ToNegativeInfinity),
            RoundingMode::HalfUp => Some(RoundingStrategy::MidpointAwayFromZero),
            RoundingMode::HalfDown => Some(RoundingStrategy::MidpointTowardZero),
            RoundingMode::HalfEven => Some(RoundingStrategy::MidpointNearestEven),
            RoundingMode::Unnecessary => None,
        }
    }

    /// Canonical upper-case name, e.g. `HALF_EVEN`.
    pub fn name(&self) -> &'static str {
        match self {
            RoundingMode::Up => "UP",
            RoundingMode::Down => "DOWN",
            RoundingMode::Ceiling => "CEILING",
            RoundingMode::Floor => "FLOOR",
            RoundingMode::HalfUp => "HALF_UP",
            RoundingMode::HalfDown => "HALF_DOWN",
            RoundingMode::HalfEven => "HALF_EVEN",
            RoundingMode::Unnecessary => "UNNECESSARY",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoundingMode {
    type Err = MonetaryError;

    /// Accepts `HALF_UP`, `half-up` and `halfup` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();
        RoundingMode::ALL
            .iter()
            .find(|mode| mode.name().replace('_', "") == wanted)
            .copied()
            .ok_or_else(|| MonetaryError::InvalidArgument(format!("Unknown rounding mode: {}", s)))
    }
}

/// A significant-digit precision paired with a rounding mode.
///
/// Precision `0` means unlimited (bounded only by [`MAX_PRECISION`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MathContext {
    pub precision: u32,
    pub rounding_mode: RoundingMode,
}

impl MathContext {
    /// 7 digits, half-even.
    pub const DECIMAL32: MathContext = MathContext::new(7, RoundingMode::HalfEven);
    /// 16 digits, half-even.
    pub const DECIMAL64: MathContext = MathContext::new(16, RoundingMode::HalfEven);
    /// 34 digits, half-even. Capped at [`MAX_PRECISION`] by the kernel.
    pub const DECIMAL128: MathContext = MathContext::new(34, RoundingMode::HalfEven);
    /// No precision limit, half-up.
    pub const UNLIMITED: MathContext = MathContext::new(0, RoundingMode::HalfUp);

    /// Create a context.
    pub const fn new(precision: u32, rounding_mode: RoundingMode) -> Self {
        Self {
            precision,
            rounding_mode,
        }
    }

    /// Whether this context never rounds below the kernel's own limit.
    pub fn is_unlimited(&self) -> bool {
        self.precision == 0 || self.precision >= MAX_PRECISION
    }

    /// Reduce `value` to this context's precision.
    pub fn round(&self, value: Decimal) -> MonetaryResult<Decimal> {
        round_to_precision(value, *self)
    }
}

impl Default for MathContext {
    fn default() -> Self {
        MathContext::DECIMAL64
    }
}

impl fmt::Display for MathContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "precision={} roundingMode={}", self.precision, self.rounding_mode)
    }
}

/// Number of digits in the unscaled value (`0` counts as one digit).
pub fn precision_of(value: Decimal) -> u32 {
    let mut mantissa = value.mantissa().unsigned_abs();
    let mut digits = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

/// Round `value` to `scale` fractional digits, padding with zeros when the
/// value has fewer.
pub fn round_to_scale(value: Decimal, scale: u32, mode: RoundingMode) -> MonetaryResult<Decimal> {
    let scale = scale.min(MAX_PRECISION);
    let mut rounded = if value.scale() <= scale {
        value
    } else {
        match mode.strategy() {
            Some(strategy) => value.round_dp_with_strategy(scale, strategy),
            None => {
                let exact = value.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
                if exact != value {
                    return Err(MonetaryError::RoundingNecessary(value.to_string()));
                }
                exact
            }
        }
    };
    if rounded.scale() < scale {
        rounded.rescale(scale);
    }
    Ok(positive_zero(rounded))
}

/// Round `value` to the significant digits of `context`.
pub fn round_to_precision(value: Decimal, context: MathContext) -> MonetaryResult<Decimal> {
    if context.is_unlimited() || value.is_zero() {
        return Ok(value);
    }
    let digits = precision_of(value);
    if digits <= context.precision {
        return Ok(value);
    }
    let rounded = match context.rounding_mode.strategy() {
        Some(strategy) => value.round_sf_with_strategy(context.precision, strategy),
        None => {
            let exact = value.round_sf_with_strategy(context.precision, RoundingStrategy::ToZero);
            if exact != Some(value) {
                return Err(MonetaryError::RoundingNecessary(value.to_string()));
            }
            exact
        }
    };
    rounded
        .map(positive_zero)
        .ok_or_else(|| MonetaryError::overflow(format!("rounding {} to {}", value, context)))
}

/// Drop the sign of a negative zero.
pub(crate) fn positive_zero(mut value: Decimal) -> Decimal {
    if value.is_zero() {
        value.set_sign_positive(true);
    }
    value
}
