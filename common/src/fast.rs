//! Fixed-point amounts on a 64-bit integer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::amount::{Amount, AmountKind, MonetaryAmount};
use crate::context::{round_to_scale, RoundingMode};
use crate::currency::CurrencyUnit;
use crate::error::{MonetaryError, MonetaryResult};
use crate::money::Money;
use crate::number::{self, ToDecimal};

/// An amount stored as `scaled_value / 10^5` in an `i64`.
///
/// Construction and every lossy operation round to five fractional digits
/// with [`FastMoney::ROUNDING_MODE`]. Addition, subtraction and negation are
/// plain integer arithmetic; overflow is reported, never wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FastMoneyRepr", into = "FastMoneyRepr")]
pub struct FastMoney {
    scaled_value: i64,
    currency: CurrencyUnit,
}

const SCALE_FACTOR: i128 = 100_000;

impl FastMoney {
    /// Fixed number of fractional digits.
    pub const SCALE: u32 = 5;

    /// Rounding applied when a value does not fit [`FastMoney::SCALE`].
    pub const ROUNDING_MODE: RoundingMode = RoundingMode::HalfUp;

    /// Create an amount, rounding to five fractional digits.
    pub fn of(currency: CurrencyUnit, number: impl ToDecimal) -> MonetaryResult<Self> {
        let scaled_value = to_scaled(number.to_decimal()?)?;
        Ok(Self {
            scaled_value,
            currency,
        })
    }

    /// Create an amount from its raw scaled representation.
    pub fn from_scaled(currency: CurrencyUnit, scaled_value: i64) -> Self {
        Self {
            scaled_value,
            currency,
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency: CurrencyUnit) -> Self {
        Self::from_scaled(currency, 0)
    }

    /// Largest representable amount.
    pub fn max_value(currency: CurrencyUnit) -> Self {
        Self::from_scaled(currency, i64::MAX)
    }

    /// Smallest representable amount.
    pub fn min_value(currency: CurrencyUnit) -> Self {
        Self::from_scaled(currency, i64::MIN)
    }

    /// The raw value, in units of `10^-5`.
    pub fn scaled_value(&self) -> i64 {
        self.scaled_value
    }

    fn derive(&self, scaled_value: i64) -> Self {
        Self::from_scaled(self.currency.clone(), scaled_value)
    }

    fn derive_decimal(&self, value: Decimal) -> MonetaryResult<Self> {
        Ok(self.derive(to_scaled(value)?))
    }

    /// Like `derive_decimal`, but fails instead of rounding.
    fn derive_exact(&self, value: Decimal) -> MonetaryResult<Self> {
        let exact = round_to_scale(value, Self::SCALE, RoundingMode::Unnecessary)?;
        self.derive_decimal(exact)
    }
}

/// Round to five fractional digits and take the mantissa.
fn to_scaled(value: Decimal) -> MonetaryResult<i64> {
    let rounded = round_to_scale(value, FastMoney::SCALE, FastMoney::ROUNDING_MODE)?;
    if rounded.scale() != FastMoney::SCALE {
        return Err(MonetaryError::overflow(format!(
            "{} exceeds the FastMoney range",
            value
        )));
    }
    i64::try_from(rounded.mantissa()).map_err(|_| {
        MonetaryError::overflow(format!("{} exceeds the FastMoney range", value))
    })
}

/// `n / d`, ties away from zero.
fn div_round_half_up(n: i128, d: i128) -> i128 {
    let quotient = n / d;
    let remainder = n % d;
    if remainder.unsigned_abs() * 2 >= d.unsigned_abs() {
        if (n < 0) == (d < 0) {
            quotient + 1
        } else {
            quotient - 1
        }
    } else {
        quotient
    }
}

fn narrow(value: i128, what: impl FnOnce() -> String) -> MonetaryResult<i64> {
    i64::try_from(value).map_err(|_| MonetaryError::overflow(what()))
}

impl MonetaryAmount for FastMoney {
    fn kind(&self) -> AmountKind {
        AmountKind::Fast
    }

    fn currency(&self) -> &CurrencyUnit {
        &self.currency
    }

    fn number(&self) -> Decimal {
        Decimal::new(self.scaled_value, Self::SCALE).normalize()
    }

    fn into_amount(self) -> Amount {
        Amount::Fast(self)
    }

    fn from_amount(amount: Amount) -> MonetaryResult<Self> {
        match amount {
            Amount::Fast(fast) => Ok(fast),
            other => Err(MonetaryError::UnexpectedVariant {
                expected: AmountKind::Fast,
                actual: other.kind(),
            }),
        }
    }

    fn with_number(&self, number: Decimal) -> MonetaryResult<Self> {
        self.derive_decimal(number)
    }

    fn with_currency(&self, currency: CurrencyUnit) -> Self {
        Self::from_scaled(currency, self.scaled_value)
    }

    fn add(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(&other.currency)?;
        self.scaled_value
            .checked_add(other.scaled_value)
            .map(|v| self.derive(v))
            .ok_or_else(|| MonetaryError::overflow(format!("{} + {}", self, other)))
    }

    fn subtract(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(&other.currency)?;
        self.scaled_value
            .checked_sub(other.scaled_value)
            .map(|v| self.derive(v))
            .ok_or_else(|| MonetaryError::overflow(format!("{} - {}", self, other)))
    }

    fn multiply_by<N: ToDecimal>(&self, multiplicand: N) -> MonetaryResult<Self> {
        let factor = multiplicand.to_decimal()?;
        let exact = i128::from(self.scaled_value)
            .checked_mul(factor.mantissa())
            .zip(10i128.checked_pow(factor.scale()));
        match exact {
            Some((product, divisor)) => {
                let scaled = div_round_half_up(product, divisor);
                Ok(self.derive(narrow(scaled, || format!("{} * {}", self, factor))?))
            }
            None => self.derive_decimal(number::checked_mul(self.number(), factor)?),
        }
    }

    fn divide_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        if divisor.is_zero() {
            return Err(MonetaryError::DivisionByZero);
        }
        let exact = 10i128
            .checked_pow(divisor.scale())
            .and_then(|shift| i128::from(self.scaled_value).checked_mul(shift));
        match exact {
            Some(numerator) => {
                let scaled = div_round_half_up(numerator, divisor.mantissa());
                Ok(self.derive(narrow(scaled, || format!("{} / {}", self, divisor))?))
            }
            None => self.derive_decimal(number::checked_div(self.number(), divisor)?),
        }
    }

    fn divide_and_remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<(Self, Self)> {
        let divisor = divisor.to_decimal()?;
        let quotient = number::divide_to_integral(self.number(), divisor)?;
        let remainder = number::remainder(self.number(), divisor)?;
        Ok((self.derive_exact(quotient)?, self.derive_exact(remainder)?))
    }

    fn divide_to_integral_value_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        self.derive_exact(number::divide_to_integral(self.number(), divisor)?)
    }

    fn remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        self.derive_exact(number::remainder(self.number(), divisor)?)
    }

    fn negate(&self) -> MonetaryResult<Self> {
        self.scaled_value
            .checked_neg()
            .map(|v| self.derive(v))
            .ok_or_else(|| MonetaryError::overflow(format!("-({})", self)))
    }

    fn plus(&self) -> MonetaryResult<Self> {
        Ok(self.clone())
    }

    fn pow(&self, exponent: u32) -> MonetaryResult<Self> {
        self.derive_decimal(number::checked_pow(self.number(), exponent)?)
    }

    fn scale_by_power_of_ten(&self, n: i32) -> MonetaryResult<Self> {
        self.derive_decimal(number::scale_by_power_of_ten(self.number(), n)?)
    }

    fn to_fast_money(&self) -> MonetaryResult<FastMoney> {
        Ok(self.clone())
    }
}

impl PartialOrd for FastMoney {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FastMoney {
    fn cmp(&self, other: &Self) -> Ordering {
        self.currency
            .cmp(&other.currency)
            .then_with(|| self.scaled_value.cmp(&other.scaled_value))
    }
}

impl fmt::Display for FastMoney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number(), self.currency)
    }
}

impl TryFrom<Money> for FastMoney {
    type Error = MonetaryError;

    fn try_from(money: Money) -> MonetaryResult<Self> {
        money.to_fast_money()
    }
}

#[derive(Serialize, Deserialize)]
struct FastMoneyRepr {
    number: Decimal,
    currency: CurrencyUnit,
}

impl TryFrom<FastMoneyRepr> for FastMoney {
    type Error = MonetaryError;

    fn try_from(repr: FastMoneyRepr) -> MonetaryResult<Self> {
        FastMoney::of(repr.currency, repr.number)
    }
}

impl From<FastMoney> for FastMoneyRepr {
    fn from(fast: FastMoney) -> Self {
        Self {
            number: fast.number(),
            currency: fast.currency,
        }
    }
}
