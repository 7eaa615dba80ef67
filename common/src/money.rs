//! Arbitrary-precision amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::amount::{Amount, AmountKind, MonetaryAmount};
use crate::context::{positive_zero, precision_of, round_to_precision, MathContext};
use crate::currency::CurrencyUnit;
use crate::error::{MonetaryError, MonetaryResult};
use crate::number::{self, ToDecimal};

/// An amount backed by an unrounded decimal.
///
/// Addition, subtraction and multiplication are exact up to the kernel's
/// 28 significant digits. Division and powers are reduced to
/// [`Money::DEFAULT_MATH_CONTEXT`].
///
/// Equality is scale-sensitive (`1.0 EUR != 1.00 EUR`); the comparison
/// methods of [`MonetaryAmount`] are not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Money {
    number: Decimal,
    currency: CurrencyUnit,
}

impl Money {
    /// Context bounding division and powers.
    pub const DEFAULT_MATH_CONTEXT: MathContext = MathContext::DECIMAL64;

    /// Create an amount from any supported numeric input.
    pub fn of(currency: CurrencyUnit, number: impl ToDecimal) -> MonetaryResult<Self> {
        Ok(Self::new(currency, number.to_decimal()?))
    }

    /// Create an amount from a decimal.
    pub fn new(currency: CurrencyUnit, number: Decimal) -> Self {
        Self {
            number: positive_zero(number),
            currency,
        }
    }

    /// Zero in the given currency.
    pub fn zero(currency: CurrencyUnit) -> Self {
        Self::new(currency, Decimal::ZERO)
    }

    /// Number of fractional digits in the stored value.
    pub fn scale(&self) -> u32 {
        self.number.scale()
    }

    /// Number of significant digits in the stored value.
    pub fn precision(&self) -> u32 {
        precision_of(self.number)
    }

    /// One unit in the last place of the stored value.
    pub fn ulp(&self) -> Decimal {
        Decimal::new(1, self.number.scale())
    }

    fn derive(&self, number: Decimal) -> Self {
        Self::new(self.currency.clone(), number)
    }

    fn bounded(&self, number: Decimal) -> MonetaryResult<Self> {
        Ok(self.derive(round_to_precision(number, Self::DEFAULT_MATH_CONTEXT)?))
    }
}

impl MonetaryAmount for Money {
    fn kind(&self) -> AmountKind {
        AmountKind::Money
    }

    fn currency(&self) -> &CurrencyUnit {
        &self.currency
    }

    fn number(&self) -> Decimal {
        self.number
    }

    fn into_amount(self) -> Amount {
        Amount::Money(self)
    }

    fn from_amount(amount: Amount) -> MonetaryResult<Self> {
        match amount {
            Amount::Money(money) => Ok(money),
            other => Err(MonetaryError::UnexpectedVariant {
                expected: AmountKind::Money,
                actual: other.kind(),
            }),
        }
    }

    fn with_number(&self, number: Decimal) -> MonetaryResult<Self> {
        Ok(self.derive(number))
    }

    fn with_currency(&self, currency: CurrencyUnit) -> Self {
        Self::new(currency, self.number)
    }

    fn add(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(&other.currency)?;
        Ok(self.derive(number::checked_add(self.number, other.number)?))
    }

    fn subtract(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(&other.currency)?;
        Ok(self.derive(number::checked_sub(self.number, other.number)?))
    }

    fn multiply_by<N: ToDecimal>(&self, multiplicand: N) -> MonetaryResult<Self> {
        let multiplicand = multiplicand.to_decimal()?;
        Ok(self.derive(number::checked_mul(self.number, multiplicand)?))
    }

    fn divide_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        self.bounded(number::checked_div(self.number, divisor)?)
    }

    fn divide_and_remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<(Self, Self)> {
        let divisor = divisor.to_decimal()?;
        let quotient = number::divide_to_integral(self.number, divisor)?;
        let remainder = number::remainder(self.number, divisor)?;
        Ok((self.derive(quotient), self.derive(remainder)))
    }

    fn divide_to_integral_value_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        Ok(self.derive(number::divide_to_integral(self.number, divisor)?))
    }

    fn remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        Ok(self.derive(number::remainder(self.number, divisor)?))
    }

    fn negate(&self) -> MonetaryResult<Self> {
        Ok(self.derive(-self.number))
    }

    fn plus(&self) -> MonetaryResult<Self> {
        Ok(self.clone())
    }

    fn pow(&self, exponent: u32) -> MonetaryResult<Self> {
        self.bounded(number::checked_pow(self.number, exponent)?)
    }

    fn scale_by_power_of_ten(&self, n: i32) -> MonetaryResult<Self> {
        Ok(self.derive(number::scale_by_power_of_ten(self.number, n)?))
    }

    fn to_money(&self) -> Money {
        self.clone()
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.currency == other.currency
            && self.number == other.number
            && self.number.scale() == other.number.scale()
    }
}

impl Eq for Money {}

impl Hash for Money {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.currency.hash(state);
        self.number.scale().hash(state);
        self.number.mantissa().hash(state);
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Money {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
            .then_with(|| self.number.scale().cmp(&other.number.scale()))
    }
}

/// Renders the normalized number, so `10.00 EUR` and `10 EUR` print alike.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number.normalize(), self.currency)
    }
}

impl From<crate::FastMoney> for Money {
    fn from(fast: crate::FastMoney) -> Self {
        fast.to_money()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CurrencyRegistry;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn eur() -> CurrencyUnit {
        CurrencyRegistry::global().of("EUR").unwrap()
    }

    fn usd() -> CurrencyUnit {
        CurrencyRegistry::global().of("USD").unwrap()
    }

    #[test]
    fn test_add() {
        let sum = Money::of(eur(), 10).unwrap().add(&Money::of(eur(), 1).unwrap()).unwrap();
        assert_eq!(sum, Money::of(eur(), 11).unwrap());
        assert_eq!(sum.to_string(), "11 EUR");
    }

    #[test]
    fn test_currency_mismatch() {
        let result = Money::of(eur(), 10).unwrap().add(&Money::of(usd(), 1).unwrap());
        assert_eq!(
            result,
            Err(MonetaryError::CurrencyMismatch {
                expected: "EUR".to_string(),
                actual: "USD".to_string(),
            })
        );
        assert!(Money::of(eur(), 10).unwrap().divide(&Money::of(usd(), 2).unwrap()).is_err());
    }

    #[test]
    fn test_divide_and_remainder() {
        let (q, r) = Money::of(eur(), 1000).unwrap().divide_and_remainder_by(11).unwrap();
        assert_eq!(q, Money::of(eur(), 90).unwrap());
        assert_eq!(r, Money::of(eur(), 10).unwrap());
        assert_eq!(q.scale(), 0);

        let (q, r) = Money::of(eur(), dec!(-10.5)).unwrap().divide_and_remainder_by(4).unwrap();
        assert_eq!(q.number(), dec!(-2));
        assert_eq!(r.number(), dec!(-2.5));
    }

    #[test]
    fn test_divide_is_bounded() {
        let third = Money::of(eur(), 1).unwrap().divide_by(3).unwrap();
        assert_eq!(third.number(), dec!(0.3333333333333333));
        assert_eq!(third.precision(), 16);
        assert_eq!(
            Money::of(eur(), 1).unwrap().divide_by(0),
            Err(MonetaryError::DivisionByZero)
        );
    }

    #[test]
    fn test_multiply_is_exact() {
        let product = Money::of(eur(), dec!(1.25)).unwrap().multiply_by(dec!(0.5)).unwrap();
        assert_eq!(product.number(), dec!(0.625));
        assert_eq!(product.scale(), 3);
    }

    #[test]
    fn test_equality_is_scale_sensitive() {
        let a = Money::of(eur(), dec!(1.0)).unwrap();
        let b = Money::of(eur(), dec!(1.00)).unwrap();
        assert_ne!(a, b);
        assert!(a.is_equal_to(&b).unwrap());
        assert_eq!(a.compare_to(&b), Ordering::Equal);

        let set: HashSet<Money> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_negate_and_abs() {
        let a = Money::of(eur(), dec!(2.5)).unwrap();
        assert_eq!(a.negate().unwrap().number(), dec!(-2.5));
        assert_eq!(a.negate().unwrap().abs().unwrap(), a);
        assert!(a.add(&a.negate().unwrap()).unwrap().is_zero());
        assert_eq!(Money::zero(eur()).negate().unwrap().to_string(), "0 EUR");
    }

    #[test]
    fn test_pow_and_scale_by_power_of_ten() {
        let a = Money::of(eur(), dec!(1.1)).unwrap();
        assert_eq!(a.pow(2).unwrap().number(), dec!(1.21));
        assert_eq!(a.scale_by_power_of_ten(2).unwrap().number(), dec!(110));
        assert_eq!(a.scale_by_power_of_ten(-1).unwrap().number(), dec!(0.11));
    }

    #[test]
    fn test_ulp() {
        assert_eq!(Money::of(eur(), dec!(12.345)).unwrap().ulp(), dec!(0.001));
        assert_eq!(Money::of(eur(), 7).unwrap().ulp(), dec!(1));
    }

    #[test]
    fn test_as_type() {
        let a = Money::of(eur(), dec!(-2.99)).unwrap();
        assert_eq!(a.as_type::<i64>().unwrap(), -2);
        assert_eq!(a.as_type::<f64>().unwrap(), -2.99);
        assert!(Money::of(eur(), 300).unwrap().as_type::<u8>().is_err());
    }

    #[test]
    fn test_with_closure_operator() {
        let double = |amount: Amount| amount.multiply_by(2);
        let a = Money::of(eur(), dec!(1.5)).unwrap();
        assert_eq!(a.with(&double).unwrap().number(), dec!(3.0));
    }

    #[test]
    fn test_with_rejects_foreign_variant() {
        let to_fast = |amount: Amount| amount.to_fast_money().map(Amount::Fast);
        let a = Money::of(eur(), 1).unwrap();
        assert_eq!(
            a.with(&to_fast),
            Err(MonetaryError::UnexpectedVariant {
                expected: AmountKind::Money,
                actual: AmountKind::Fast,
            })
        );
    }

    #[test]
    fn test_serde_round_trip_keeps_scale() {
        let a = Money::of(eur(), dec!(1.50)).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.scale(), 2);
    }

    #[test]
    fn test_float_input() {
        let a = Money::of(eur(), 0.1_f64).unwrap();
        assert_eq!(a.number(), dec!(0.1));
        assert!(Money::of(eur(), f64::NAN).is_err());
    }
}
