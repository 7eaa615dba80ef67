//! Reference operators and queries.

use rust_decimal::Decimal;
use std::fmt;

use crate::amount::{Amount, MonetaryAmount};
use crate::context::{round_to_precision, round_to_scale, MathContext, RoundingMode};
use crate::currency::CurrencyUnit;
use crate::error::{MonetaryError, MonetaryResult};
use crate::number::{self, NumberKind, ToDecimal};
use crate::operator::{MonetaryOperator, MonetaryQuery};

/// Rounds to a fixed number of fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefaultRounding {
    scale: u32,
    mode: RoundingMode,
}

impl DefaultRounding {
    /// Mode used by the currency-derived form.
    pub const DEFAULT_MODE: RoundingMode = RoundingMode::HalfUp;

    /// Round to `scale` digits; a negative scale rounds to whole units.
    pub fn new(scale: i32, mode: RoundingMode) -> Self {
        Self {
            scale: u32::try_from(scale).unwrap_or(0),
            mode,
        }
    }

    /// Round to the currency's default fraction digits, half up.
    pub fn of_currency(currency: &CurrencyUnit) -> Self {
        Self::of_currency_with_mode(currency, Self::DEFAULT_MODE)
    }

    pub fn of_currency_with_mode(currency: &CurrencyUnit, mode: RoundingMode) -> Self {
        Self {
            scale: currency.default_fraction_digits(),
            mode,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn mode(&self) -> RoundingMode {
        self.mode
    }
}

impl MonetaryOperator for DefaultRounding {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        amount.with_number(round_to_scale(amount.number(), self.scale, self.mode)?)
    }
}

impl fmt::Display for DefaultRounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefaultRounding[scale={}, mode={}]", self.scale, self.mode)
    }
}

/// Rounds to the nearest multiple of a minimal cash increment, e.g. CHF 0.05.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CashRounding {
    scale: u32,
    increment: Decimal,
    mode: RoundingMode,
}

impl CashRounding {
    pub fn new(scale: u32, increment: Decimal, mode: RoundingMode) -> MonetaryResult<Self> {
        if increment <= Decimal::ZERO {
            return Err(MonetaryError::InvalidArgument(format!(
                "Cash increment must be positive, got {}",
                increment
            )));
        }
        Ok(Self {
            scale,
            increment,
            mode,
        })
    }

    pub fn increment(&self) -> Decimal {
        self.increment
    }
}

impl MonetaryOperator for CashRounding {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        let steps = number::checked_div(amount.number(), self.increment)?;
        let steps = round_to_scale(steps, 0, self.mode)?;
        let cash = number::checked_mul(steps, self.increment)?;
        amount.with_number(round_to_scale(cash, self.scale, self.mode)?)
    }
}

/// Integral part, truncated toward zero: `2.35 -> 2`, `-1.345 -> -1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MajorPart;

impl MonetaryOperator for MajorPart {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        amount.with_number(round_to_scale(amount.number(), 0, RoundingMode::Down)?)
    }
}

/// Fractional part expressed in minor units of the currency:
/// `2.35 EUR -> 35 EUR`, `-1.345 BHD -> -345 BHD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MinorPart;

impl MonetaryOperator for MinorPart {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        let digits = amount.currency().default_fraction_digits();
        let fraction = number::checked_sub(amount.number(), amount.number().trunc())?;
        let shifted = scaled_by_digits(fraction, digits)?;
        amount.with_number(round_to_scale(shifted, 0, RoundingMode::Down)?)
    }
}

/// `1 / amount` at [`MathContext::DECIMAL128`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Reciprocal;

impl MonetaryOperator for Reciprocal {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        let inverse = number::checked_div(Decimal::ONE, amount.number())?;
        amount.with_number(round_to_precision(inverse, MathContext::DECIMAL128)?)
    }
}

/// Multiplies by `p / 1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permil {
    permil: Decimal,
    factor: Decimal,
}

impl Permil {
    pub fn new(permil: impl ToDecimal) -> MonetaryResult<Self> {
        let permil = permil.to_decimal()?;
        let factor = number::checked_div(permil, Decimal::ONE_THOUSAND)?;
        Ok(Self {
            permil,
            factor: round_to_precision(factor, MathContext::DECIMAL64)?,
        })
    }
}

impl MonetaryOperator for Permil {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        amount.multiply_by(self.factor)
    }
}

impl fmt::Display for Permil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \u{2030}", self.permil)
    }
}

/// Multiplies by `p / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Percent {
    percent: Decimal,
    factor: Decimal,
}

impl Percent {
    pub fn new(percent: impl ToDecimal) -> MonetaryResult<Self> {
        let percent = percent.to_decimal()?;
        let factor = number::checked_div(percent, Decimal::ONE_HUNDRED)?;
        Ok(Self {
            percent,
            factor: round_to_precision(factor, MathContext::DECIMAL64)?,
        })
    }
}

impl MonetaryOperator for Percent {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        amount.multiply_by(self.factor)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} %", self.percent)
    }
}

/// Whole major units, truncated: `2.35 EUR -> 2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MajorUnits;

impl MonetaryQuery<i64> for MajorUnits {
    fn query(&self, amount: &Amount) -> MonetaryResult<i64> {
        i64::from_decimal(amount.number())
    }
}

/// The whole amount in minor units, truncated: `2.35 EUR -> 235`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MinorUnits;

impl MonetaryQuery<i64> for MinorUnits {
    fn query(&self, amount: &Amount) -> MonetaryResult<i64> {
        let digits = amount.currency().default_fraction_digits();
        i64::from_decimal(scaled_by_digits(amount.number(), digits)?)
    }
}

fn scaled_by_digits(value: Decimal, digits: u32) -> MonetaryResult<Decimal> {
    let digits = i32::try_from(digits)
        .map_err(|_| MonetaryError::InvalidArgument(format!("{} fraction digits", digits)))?;
    number::scale_by_power_of_ten(value, digits)
}
