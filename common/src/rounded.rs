//! Amounts held to a precision context.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::amount::{Amount, AmountKind, MonetaryAmount};
use crate::context::{positive_zero, round_to_precision, MathContext, RoundingMode};
use crate::currency::CurrencyUnit;
use crate::error::{MonetaryError, MonetaryResult};
use crate::number::{self, ToDecimal};
use crate::operator::SharedOperator;

/// An amount whose value is reduced to a [`MathContext`] after construction
/// and after every operation.
///
/// An optional pending rounding operator runs after the context is applied,
/// e.g. to keep results at the currency's minor unit. The operator is
/// carried through every derived value but takes no part in equality and is
/// not serialized.
///
/// Integral division is exact: the quotient and remainder of
/// [`MonetaryAmount::divide_and_remainder_by`] must both fit the context
/// unrounded, otherwise the division fails with
/// [`MonetaryError::ArithmeticOverflow`]. The pending rounding is carried to
/// both parts but not applied to them.
///
/// Equality, hashing and ordering look at currency and number only; two
/// amounts under different contexts compare equal when their values match.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "RoundedMoneyRepr", into = "RoundedMoneyRepr")]
pub struct RoundedMoney {
    number: Decimal,
    math_context: MathContext,
    currency: CurrencyUnit,
    rounding: Option<SharedOperator>,
}

impl RoundedMoney {
    /// Context used when none is given.
    pub const DEFAULT_MATH_CONTEXT: MathContext = MathContext::DECIMAL64;

    /// Create an amount under [`RoundedMoney::DEFAULT_MATH_CONTEXT`].
    pub fn of(currency: CurrencyUnit, number: impl ToDecimal) -> MonetaryResult<Self> {
        Self::of_with_context(currency, number, Self::DEFAULT_MATH_CONTEXT)
    }

    /// Create an amount under the given context.
    pub fn of_with_context(
        currency: CurrencyUnit,
        number: impl ToDecimal,
        math_context: MathContext,
    ) -> MonetaryResult<Self> {
        let number = number.to_decimal()?;
        let seed = Self {
            number: Decimal::ZERO,
            math_context,
            currency,
            rounding: None,
        };
        seed.finish(number)
    }

    /// Zero in the given currency, under the default context.
    pub fn zero(currency: CurrencyUnit) -> Self {
        Self {
            number: Decimal::ZERO,
            math_context: Self::DEFAULT_MATH_CONTEXT,
            currency,
            rounding: None,
        }
    }

    pub fn math_context(&self) -> MathContext {
        self.math_context
    }

    pub fn pending_rounding(&self) -> Option<&SharedOperator> {
        self.rounding.as_ref()
    }

    /// Same value re-rounded under another context.
    pub fn with_math_context(&self, math_context: MathContext) -> MonetaryResult<Self> {
        let target = Self {
            math_context,
            ..self.clone()
        };
        target.finish(self.number)
    }

    /// Attach an operator that runs after the context on every result,
    /// starting with this value.
    pub fn with_pending_rounding(&self, rounding: SharedOperator) -> MonetaryResult<Self> {
        let target = Self {
            rounding: Some(rounding),
            ..self.clone()
        };
        target.finish(self.number)
    }

    /// Reduce `number` to the context, then run the pending rounding.
    fn finish(&self, number: Decimal) -> MonetaryResult<Self> {
        let reduced = Self {
            number: positive_zero(round_to_precision(number, self.math_context)?),
            math_context: self.math_context,
            currency: self.currency.clone(),
            rounding: None,
        };
        let Some(rounding) = &self.rounding else {
            return Ok(reduced);
        };
        let mut result = Self::from_amount(rounding.apply(Amount::Rounded(reduced))?)?;
        result.number = positive_zero(round_to_precision(result.number, self.math_context)?);
        result.math_context = self.math_context;
        result.rounding = Some(rounding.clone());
        Ok(result)
    }

    /// Keep `number` as is, provided it fits the context without rounding.
    fn exact(&self, number: Decimal, part: &str) -> MonetaryResult<Self> {
        let truncating = MathContext::new(self.math_context.precision, RoundingMode::Down);
        if round_to_precision(number, truncating)? != number {
            return Err(MonetaryError::overflow(format!(
                "Division impossible: {} {} needs more than {} digits",
                part, number, self.math_context.precision
            )));
        }
        Ok(Self {
            number: positive_zero(number),
            ..self.clone()
        })
    }

    fn integral_division(&self, divisor: Decimal) -> MonetaryResult<(Self, Self)> {
        let quotient = number::divide_to_integral(self.number, divisor)?;
        let quotient = self.exact(quotient, "quotient")?;
        let remainder = number::remainder(self.number, divisor)?;
        Ok((quotient, self.exact(remainder, "remainder")?))
    }
}

impl MonetaryAmount for RoundedMoney {
    fn kind(&self) -> AmountKind {
        AmountKind::Rounded
    }

    fn currency(&self) -> &CurrencyUnit {
        &self.currency
    }

    fn number(&self) -> Decimal {
        self.number
    }

    fn into_amount(self) -> Amount {
        Amount::Rounded(self)
    }

    fn from_amount(amount: Amount) -> MonetaryResult<Self> {
        match amount {
            Amount::Rounded(rounded) => Ok(rounded),
            other => Err(MonetaryError::UnexpectedVariant {
                expected: AmountKind::Rounded,
                actual: other.kind(),
            }),
        }
    }

    fn with_number(&self, number: Decimal) -> MonetaryResult<Self> {
        self.finish(number)
    }

    fn with_currency(&self, currency: CurrencyUnit) -> Self {
        Self {
            currency,
            ..self.clone()
        }
    }

    fn add(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(&other.currency)?;
        self.finish(number::checked_add(self.number, other.number)?)
    }

    fn subtract(&self, other: &Self) -> MonetaryResult<Self> {
        self.check_currency(&other.currency)?;
        self.finish(number::checked_sub(self.number, other.number)?)
    }

    fn multiply_by<N: ToDecimal>(&self, multiplicand: N) -> MonetaryResult<Self> {
        let multiplicand = multiplicand.to_decimal()?;
        self.finish(number::checked_mul(self.number, multiplicand)?)
    }

    fn divide_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        self.finish(number::checked_div(self.number, divisor)?)
    }

    fn divide_and_remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<(Self, Self)> {
        self.integral_division(divisor.to_decimal()?)
    }

    fn divide_to_integral_value_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let divisor = divisor.to_decimal()?;
        self.exact(number::divide_to_integral(self.number, divisor)?, "quotient")
    }

    fn remainder_by<N: ToDecimal>(&self, divisor: N) -> MonetaryResult<Self> {
        let (_, remainder) = self.integral_division(divisor.to_decimal()?)?;
        Ok(remainder)
    }

    fn negate(&self) -> MonetaryResult<Self> {
        self.finish(-self.number)
    }

    fn plus(&self) -> MonetaryResult<Self> {
        self.finish(self.number)
    }

    fn pow(&self, exponent: u32) -> MonetaryResult<Self> {
        self.finish(number::checked_pow(self.number, exponent)?)
    }

    fn scale_by_power_of_ten(&self, n: i32) -> MonetaryResult<Self> {
        self.finish(number::scale_by_power_of_ten(self.number, n)?)
    }
}

impl PartialEq for RoundedMoney {
    fn eq(&self, other: &Self) -> bool {
        self.currency == other.currency
            && self.number == other.number
            && self.number.scale() == other.number.scale()
    }
}

impl Eq for RoundedMoney {}

impl Hash for RoundedMoney {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.currency.hash(state);
        self.number.scale().hash(state);
        self.number.mantissa().hash(state);
    }
}

impl PartialOrd for RoundedMoney {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoundedMoney {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
            .then_with(|| self.number.scale().cmp(&other.number.scale()))
    }
}

impl fmt::Debug for RoundedMoney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundedMoney")
            .field("number", &self.number)
            .field("math_context", &self.math_context)
            .field("currency", &self.currency)
            .field("pending_rounding", &self.rounding.is_some())
            .finish()
    }
}

impl fmt::Display for RoundedMoney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number.normalize(), self.currency)
    }
}

#[derive(Serialize, Deserialize)]
struct RoundedMoneyRepr {
    number: Decimal,
    math_context: MathContext,
    currency: CurrencyUnit,
}

impl TryFrom<RoundedMoneyRepr> for RoundedMoney {
    type Error = MonetaryError;

    fn try_from(repr: RoundedMoneyRepr) -> MonetaryResult<Self> {
        RoundedMoney::of_with_context(repr.currency, repr.number, repr.math_context)
    }
}

impl From<RoundedMoney> for RoundedMoneyRepr {
    fn from(rounded: RoundedMoney) -> Self {
        Self {
            number: rounded.number,
            math_context: rounded.math_context,
            currency: rounded.currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::DefaultRounding;
    use crate::registry::CurrencyRegistry;
    use crate::FastMoney;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn eur() -> CurrencyUnit {
        CurrencyRegistry::global().of("EUR").unwrap()
    }

    #[test]
    fn test_construction_applies_context() {
        let a = RoundedMoney::of_with_context(eur(), dec!(1.23456789), MathContext::DECIMAL32)
            .unwrap();
        assert_eq!(a.number(), dec!(1.234568));
        assert_eq!(a.math_context(), MathContext::DECIMAL32);
    }

    #[test]
    fn test_arithmetic_applies_context() {
        let ctx = MathContext::new(4, RoundingMode::HalfUp);
        let a = RoundedMoney::of_with_context(eur(), dec!(10), ctx).unwrap();
        assert_eq!(a.divide_by(3).unwrap().number(), dec!(3.333));
        assert_eq!(a.multiply_by(dec!(1.23456)).unwrap().number(), dec!(12.35));
        assert_eq!(
            a.add(&RoundedMoney::of_with_context(eur(), dec!(0.00049), ctx).unwrap())
                .unwrap()
                .number(),
            dec!(10.00)
        );
    }

    #[test]
    fn test_default_context_is_decimal64() {
        let a = RoundedMoney::of(eur(), 1).unwrap();
        assert_eq!(a.math_context(), MathContext::DECIMAL64);
        assert_eq!(a.divide_by(3).unwrap().number(), dec!(0.3333333333333333));
    }

    #[test]
    fn test_unnecessary_context_fails_on_loss() {
        let ctx = MathContext::new(2, RoundingMode::Unnecessary);
        assert!(matches!(
            RoundedMoney::of_with_context(eur(), dec!(1.25), ctx),
            Err(MonetaryError::RoundingNecessary(_))
        ));
        assert!(RoundedMoney::of_with_context(eur(), dec!(1.2), ctx).is_ok());
    }

    #[test]
    fn test_pending_rounding_follows_every_result() {
        let rounding: SharedOperator = Arc::new(DefaultRounding::of_currency(&eur()));
        let a = RoundedMoney::of(eur(), dec!(10.005))
            .unwrap()
            .with_pending_rounding(rounding)
            .unwrap();
        assert_eq!(a.number(), dec!(10.01));
        assert!(a.pending_rounding().is_some());

        let third = a.divide_by(3).unwrap();
        assert_eq!(third.number(), dec!(3.34));
        assert!(third.pending_rounding().is_some());
    }

    #[test]
    fn test_pending_rounding_must_keep_variant() {
        let to_fast: SharedOperator =
            Arc::new(|amount: Amount| amount.to_fast_money().map(FastMoney::into_amount));
        let result = RoundedMoney::of(eur(), 1).unwrap().with_pending_rounding(to_fast);
        assert_eq!(
            result.err(),
            Some(MonetaryError::UnexpectedVariant {
                expected: AmountKind::Rounded,
                actual: AmountKind::Fast,
            })
        );
    }

    #[test]
    fn test_with_math_context_rerounds() {
        let a = RoundedMoney::of(eur(), dec!(123.456)).unwrap();
        let b = a.with_math_context(MathContext::new(3, RoundingMode::Down)).unwrap();
        assert_eq!(b.number(), dec!(123));
        assert_ne!(a, b);
    }

    #[test]
    fn test_equality_ignores_context() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |amount: &RoundedMoney| {
            let mut hasher = DefaultHasher::new();
            amount.hash(&mut hasher);
            hasher.finish()
        };
        let a = RoundedMoney::of_with_context(eur(), 1, MathContext::DECIMAL32).unwrap();
        let b = RoundedMoney::of_with_context(eur(), 1, MathContext::DECIMAL64).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash(&a), hash(&b));
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let scaled = RoundedMoney::of_with_context(eur(), dec!(1.0), MathContext::DECIMAL64).unwrap();
        assert_ne!(a, scaled);
    }

    #[test]
    fn test_integral_division_is_exact_or_fails() {
        let ctx = MathContext::new(2, RoundingMode::HalfEven);
        let a = RoundedMoney::of_with_context(eur(), 99, ctx).unwrap();
        assert!(matches!(
            a.divide_and_remainder_by(dec!(0.7)),
            Err(MonetaryError::ArithmeticOverflow(_))
        ));
        assert!(matches!(
            a.divide_to_integral_value_by(dec!(0.7)),
            Err(MonetaryError::ArithmeticOverflow(_))
        ));
        assert!(a.remainder_by(dec!(0.7)).is_err());

        let (q, r) = a.divide_and_remainder_by(10).unwrap();
        assert_eq!((q.number(), r.number()), (dec!(9), dec!(9)));
        assert_eq!(q.number() * dec!(10) + r.number(), a.number());

        let b = RoundedMoney::of_with_context(eur(), 98, ctx).unwrap();
        let (q, r) = b.divide_and_remainder_by(dec!(0.7)).unwrap();
        assert_eq!((q.number(), r.number()), (dec!(140), dec!(0.0)));
        assert_eq!(b.divide_to_integral_value_by(dec!(0.7)).unwrap(), q);
    }

    #[test]
    fn test_integral_division_keeps_pending_rounding_unapplied() {
        let rounding: SharedOperator = Arc::new(DefaultRounding::new(0, RoundingMode::Down));
        let a = RoundedMoney::of(eur(), dec!(7.5))
            .unwrap()
            .with_pending_rounding(rounding)
            .unwrap();
        assert_eq!(a.number(), dec!(7));

        let (q, r) = a.divide_and_remainder_by(dec!(2.5)).unwrap();
        assert_eq!((q.number(), r.number()), (dec!(2), dec!(2.0)));
        assert!(q.pending_rounding().is_some() && r.pending_rounding().is_some());
    }

    #[test]
    fn test_serde_round_trip() {
        let a = RoundedMoney::of_with_context(eur(), dec!(2.50), MathContext::DECIMAL32).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("math_context"));
        let back: RoundedMoney = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.math_context(), MathContext::DECIMAL32);
    }

    #[test]
    fn test_deserialize_applies_context() {
        let json = serde_json::json!({
            "number": "1.23456789",
            "math_context": {"precision": 2, "rounding_mode": "HALF_EVEN"},
            "currency": serde_json::to_value(eur()).unwrap(),
        });
        let rounded: RoundedMoney = serde_json::from_value(json).unwrap();
        assert_eq!(rounded.number(), dec!(1.2));
        assert_eq!(rounded.math_context(), MathContext::new(2, RoundingMode::HalfEven));
    }
}
