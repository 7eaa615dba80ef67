//! The monetary amount contract and the tagged union over its representations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::context::MathContext;
use crate::currency::CurrencyUnit;
use crate::error::{MonetaryError, MonetaryResult};
use crate::fast::FastMoney;
use crate::money::Money;
use crate::number::{NumberKind, ToDecimal};
use crate::operator::{MonetaryOperator, MonetaryQuery};
use crate::rounded::RoundedMoney;

/// The numeric representation behind an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AmountKind {
    /// Arbitrary-precision decimal ([`Money`]).
    Money,
    /// Decimal reduced to a precision context ([`RoundedMoney`]).
    Rounded,
    /// Fixed-point 64-bit integer ([`FastMoney`]).
    Fast,
}

impl fmt::Display for AmountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountKind::Money => f.write_str("Money"),
            AmountKind::Rounded => f.write_str("RoundedMoney"),
            AmountKind::Fast => f.write_str("FastMoney"),
        }
    }
}

/// Arithmetic contract shared by every amount representation.
///
/// Every operation returns a new value of the receiver's type. Binary
/// operations between amounts require equal currencies and fail with
/// [`MonetaryError::CurrencyMismatch`] otherwise; nothing is computed in that
/// case. Mixing representations is never implicit: convert first with
/// [`to_money`](Self::to_money), [`to_fast_money`](Self::to_fast_money) or
/// [`to_rounded_money`](Self::to_rounded_money).
pub trait MonetaryAmount: Clone + fmt::Debug + fmt::Display + Sized {
    /// The representation of this value.
    fn kind(&self) -> AmountKind;

    fn currency(&self) -> &CurrencyUnit;

    /// The exact stored value.
    fn number(&self) -> Decimal;

    /// Wrap into the tagged union.
    fn into_amount(self) -> Amount;

    /// Unwrap from the tagged union. Fails unless `amount` has this
    /// representation.
    fn from_amount(amount: Amount) -> MonetaryResult<Self>;

    /// Same representation and currency, new value. The value goes through
    /// this representation's precision discipline.
    fn with_number(&self, number: Decimal) -> MonetaryResult<Self>;

    /// Same value, other currency.
    fn with_currency(&self, currency: CurrencyUnit) -> Self;

    fn add(&self, other: &Self) -> MonetaryResult<Self>;

    fn subtract(&self, other: &Self) -> MonetaryResult<Self>;

    fn multiply_by<N: ToDecimal>(&self, multiplicand: N) -> MonetaryResult<Self>;

    fn divide_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self>;

    /// Integral quotient (scale 0) and remainder, with
    /// `quotient * divisor + remainder == self`.
    fn divide_and_remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<(Self, Self)>;

    /// Quotient truncated toward zero.
    fn divide_to_integral_value_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self>;

    /// `self - divide_to_integral_value(divisor) * divisor`.
    fn remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self>;

    fn negate(&self) -> MonetaryResult<Self>;

    /// Identity, after applying the representation's precision discipline.
    fn plus(&self) -> MonetaryResult<Self>;

    fn pow(&self, exponent: u32) -> MonetaryResult<Self>;

    fn scale_by_power_of_ten(&self, n: i32) -> MonetaryResult<Self>;

    fn multiply(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(other.currency())?;
        self.multiply_by(other.number())
    }

    fn divide(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(other.currency())?;
        self.divide_by(other.number())
    }

    fn divide_and_remainder(&self, other: &Self) -> MonetaryResult<(Self, Self)> {
        self.check_currency(other.currency())?;
        self.divide_and_remainder_by(other.number())
    }

    fn divide_to_integral_value(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(other.currency())?;
        self.divide_to_integral_value_by(other.number())
    }

    fn remainder(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(other.currency())?;
        self.remainder_by(other.number())
    }

    fn abs(&self) -> MonetaryResult<Self> {
        if self.signum() >= 0 {
            Ok(self.clone())
        } else {
            self.negate()
        }
    }

    /// `-1`, `0` or `1`.
    fn signum(&self) -> i32 {
        let number = self.number();
        if number.is_zero() {
            0
        } else if number.is_sign_negative() {
            -1
        } else {
            1
        }
    }

    fn is_zero(&self) -> bool {
        self.signum() == 0
    }

    fn is_positive(&self) -> bool {
        self.signum() > 0
    }

    fn is_positive_or_zero(&self) -> bool {
        self.signum() >= 0
    }

    fn is_negative(&self) -> bool {
        self.signum() < 0
    }

    fn is_negative_or_zero(&self) -> bool {
        self.signum() <= 0
    }

    /// Fail with [`MonetaryError::CurrencyMismatch`] unless `currency` is ours.
    fn check_currency(&self, currency: &CurrencyUnit) -> MonetaryResult<()> {
        if self.currency() != currency {
            return Err(MonetaryError::mismatch(
                self.currency().code(),
                currency.code(),
            ));
        }
        Ok(())
    }

    fn is_less_than<A: MonetaryAmount>(&self, other: &A) -> MonetaryResult<bool> {
        self.check_currency(other.currency())?;
        Ok(self.number() < other.number())
    }

    fn is_less_than_or_equal_to<A: MonetaryAmount>(&self, other: &A) -> MonetaryResult<bool> {
        self.check_currency(other.currency())?;
        Ok(self.number() <= other.number())
    }

    fn is_greater_than<A: MonetaryAmount>(&self, other: &A) -> MonetaryResult<bool> {
        self.check_currency(other.currency())?;
        Ok(self.number() > other.number())
    }

    fn is_greater_than_or_equal_to<A: MonetaryAmount>(&self, other: &A) -> MonetaryResult<bool> {
        self.check_currency(other.currency())?;
        Ok(self.number() >= other.number())
    }

    /// Numeric equality, ignoring scale and representation.
    fn is_equal_to<A: MonetaryAmount>(&self, other: &A) -> MonetaryResult<bool> {
        self.check_currency(other.currency())?;
        Ok(self.number() == other.number())
    }

    fn is_not_equal_to<A: MonetaryAmount>(&self, other: &A) -> MonetaryResult<bool> {
        self.is_equal_to(other).map(|equal| !equal)
    }

    /// Total order: currency code first, then numeric value.
    fn compare_to<A: MonetaryAmount>(&self, other: &A) -> Ordering {
        self.currency()
            .code()
            .cmp(other.currency().code())
            .then_with(|| self.number().cmp(&other.number()))
    }

    /// Apply an operator. Its result must keep this representation.
    fn with(&self, operator: &dyn MonetaryOperator) -> MonetaryResult<Self> {
        let result = operator.apply(self.clone().into_amount())?;
        if result.kind() != self.kind() {
            return Err(MonetaryError::UnexpectedVariant {
                expected: self.kind(),
                actual: result.kind(),
            });
        }
        Self::from_amount(result)
    }

    /// Extract a value through a query.
    fn query<T>(&self, query: &dyn MonetaryQuery<T>) -> MonetaryResult<T> {
        query.query(&self.clone().into_amount())
    }

    /// Project the value onto a numeric type.
    fn as_type<T: NumberKind>(&self) -> MonetaryResult<T> {
        T::from_decimal(self.number())
    }

    /// Convert into an arbitrary-precision amount.
    fn to_money(&self) -> Money {
        Money::new(self.currency().clone(), self.number())
    }

    /// Convert into a fixed-point amount, rounding to its scale.
    fn to_fast_money(&self) -> MonetaryResult<FastMoney> {
        FastMoney::of(self.currency().clone(), self.number())
    }

    /// Convert into a rounded amount under `context`.
    fn to_rounded_money(&self, context: MathContext) -> MonetaryResult<RoundedMoney> {
        RoundedMoney::of_with_context(self.currency().clone(), self.number(), context)
    }
}

/// Any amount, tagged by representation.
///
/// Operators and queries receive this type. Binary operations between two
/// `Amount`s require the same representation and fail with
/// [`MonetaryError::UnexpectedVariant`] otherwise. Values of different
/// representations are never equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Amount {
    Money(Money),
    Rounded(RoundedMoney),
    Fast(FastMoney),
}

macro_rules! each {
    ($amount:expr, $inner:ident => $body:expr) => {
        match $amount {
            Amount::Money($inner) => $body,
            Amount::Rounded($inner) => $body,
            Amount::Fast($inner) => $body,
        }
    };
}

macro_rules! each_wrapped {
    ($amount:expr, $inner:ident => $body:expr) => {
        match $amount {
            Amount::Money($inner) => $body.map(Amount::Money),
            Amount::Rounded($inner) => $body.map(Amount::Rounded),
            Amount::Fast($inner) => $body.map(Amount::Fast),
        }
    };
}

macro_rules! pairwise {
    ($left:expr, $right:expr, ($a:ident, $b:ident) => $body:expr) => {
        match ($left, $right) {
            (Amount::Money($a), Amount::Money($b)) => $body.map(Amount::Money),
            (Amount::Rounded($a), Amount::Rounded($b)) => $body.map(Amount::Rounded),
            (Amount::Fast($a), Amount::Fast($b)) => $body.map(Amount::Fast),
            (left, right) => Err(MonetaryError::UnexpectedVariant {
                expected: left.kind(),
                actual: right.kind(),
            }),
        }
    };
}

impl MonetaryAmount for Amount {
    fn kind(&self) -> AmountKind {
        match self {
            Amount::Money(_) => AmountKind::Money,
            Amount::Rounded(_) => AmountKind::Rounded,
            Amount::Fast(_) => AmountKind::Fast,
        }
    }

    fn currency(&self) -> &CurrencyUnit {
        each!(self, a => a.currency())
    }

    fn number(&self) -> Decimal {
        each!(self, a => a.number())
    }

    fn into_amount(self) -> Amount {
        self
    }

    fn from_amount(amount: Amount) -> MonetaryResult<Self> {
        Ok(amount)
    }

    fn with_number(&self, number: Decimal) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.with_number(number))
    }

    fn with_currency(&self, currency: CurrencyUnit) -> Self {
        match self {
            Amount::Money(a) => Amount::Money(a.with_currency(currency)),
            Amount::Rounded(a) => Amount::Rounded(a.with_currency(currency)),
            Amount::Fast(a) => Amount::Fast(a.with_currency(currency)),
        }
    }

    fn add(&self, other: &Self) -> MonetaryResult<Self> {
        pairwise!(self, other, (a, b) => a.add(b))
    }

    fn subtract(&self, other: &Self) -> MonetaryResult<Self> {
        pairwise!(self, other, (a, b) => a.subtract(b))
    }

    fn multiply(&self, other: &Self) -> MonetaryResult<Self> {
        pairwise!(self, other, (a, b) => a.multiply(b))
    }

    fn divide(&self, other: &Self) -> MonetaryResult<Self> {
        pairwise!(self, other, (a, b) => a.divide(b))
    }

    fn divide_and_remainder(&self, other: &Self) -> MonetaryResult<(Self, Self)> {
        match (self, other) {
            (Amount::Money(a), Amount::Money(b)) => a
                .divide_and_remainder(b)
                .map(|(q, r)| (Amount::Money(q), Amount::Money(r))),
            (Amount::Rounded(a), Amount::Rounded(b)) => a
                .divide_and_remainder(b)
                .map(|(q, r)| (Amount::Rounded(q), Amount::Rounded(r))),
            (Amount::Fast(a), Amount::Fast(b)) => a
                .divide_and_remainder(b)
                .map(|(q, r)| (Amount::Fast(q), Amount::Fast(r))),
            (left, right) => Err(MonetaryError::UnexpectedVariant {
                expected: left.kind(),
                actual: right.kind(),
            }),
        }
    }

    fn divide_to_integral_value(&self, other: &Self) -> MonetaryResult<Self> {
        pairwise!(self, other, (a, b) => a.divide_to_integral_value(b))
    }

    fn remainder(&self, other: &Self) -> MonetaryResult<Self> {
        pairwise!(self, other, (a, b) => a.remainder(b))
    }

    fn multiply_by<N: ToDecimal>(&self, multiplicand: N) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.multiply_by(&multiplicand))
    }

    fn divide_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.divide_by(&divisor))
    }

    fn divide_and_remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<(Self, Self)> {
        match self {
            Amount::Money(a) => a
                .divide_and_remainder_by(divisor)
                .map(|(q, r)| (Amount::Money(q), Amount::Money(r))),
            Amount::Rounded(a) => a
                .divide_and_remainder_by(divisor)
                .map(|(q, r)| (Amount::Rounded(q), Amount::Rounded(r))),
            Amount::Fast(a) => a
                .divide_and_remainder_by(divisor)
                .map(|(q, r)| (Amount::Fast(q), Amount::Fast(r))),
        }
    }

    fn divide_to_integral_value_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.divide_to_integral_value_by(&divisor))
    }

    fn remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.remainder_by(&divisor))
    }

    fn negate(&self) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.negate())
    }

    fn plus(&self) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.plus())
    }

    fn pow(&self, exponent: u32) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.pow(exponent))
    }

    fn scale_by_power_of_ten(&self, n: i32) -> MonetaryResult<Self> {
        each_wrapped!(self, a => a.scale_by_power_of_ten(n))
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by currency code and value, then by representation, then by the
/// representation's own tie-breaks, so that the order agrees with `==`.
impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
            .then_with(|| self.kind().cmp(&other.kind()))
            .then_with(|| match (self, other) {
                (Amount::Money(a), Amount::Money(b)) => a.cmp(b),
                (Amount::Rounded(a), Amount::Rounded(b)) => a.cmp(b),
                (Amount::Fast(a), Amount::Fast(b)) => a.cmp(b),
                _ => Ordering::Equal,
            })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        each!(self, a => fmt::Display::fmt(a, f))
    }
}

impl From<Money> for Amount {
    fn from(money: Money) -> Self {
        Amount::Money(money)
    }
}

impl From<RoundedMoney> for Amount {
    fn from(money: RoundedMoney) -> Self {
        Amount::Rounded(money)
    }
}

impl From<FastMoney> for Amount {
    fn from(money: FastMoney) -> Self {
        Amount::Fast(money)
    }
}
