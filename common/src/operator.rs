//! Operator and query extension points.
//!
//! An operator maps an amount to another amount; a query extracts a value
//! from an amount. Both are plain single-method traits, implemented by the
//! reference functions in [`crate::functions`] and by any matching closure.

use std::sync::Arc;

use crate::amount::Amount;
use crate::error::MonetaryResult;

/// Transformation applied through [`MonetaryAmount::with`].
///
/// [`MonetaryAmount::with`]: crate::MonetaryAmount::with
pub trait MonetaryOperator: Send + Sync {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount>;
}

impl<F> MonetaryOperator for F
where
    F: Fn(Amount) -> MonetaryResult<Amount> + Send + Sync,
{
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        self(amount)
    }
}

/// Extraction applied through [`MonetaryAmount::query`].
///
/// [`MonetaryAmount::query`]: crate::MonetaryAmount::query
pub trait MonetaryQuery<T> {
    fn query(&self, amount: &Amount) -> MonetaryResult<T>;
}

impl<T, F> MonetaryQuery<T> for F
where
    F: Fn(&Amount) -> MonetaryResult<T>,
{
    fn query(&self, amount: &Amount) -> MonetaryResult<T> {
        self(amount)
    }
}

/// Shared, thread-safe operator handle.
pub type SharedOperator = Arc<dyn MonetaryOperator>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::MonetaryAmount;
    use crate::registry::CurrencyRegistry;
    use crate::Money;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_closures_as_operator_and_query() {
        let eur = CurrencyRegistry::global().of("EUR").unwrap();
        let amount = Money::of(eur, dec!(4.2)).unwrap();

        let halve = |a: Amount| a.divide_by(2);
        let shared: SharedOperator = Arc::new(halve);
        assert_eq!(amount.with(shared.as_ref()).unwrap().number(), dec!(2.1));

        let number = |a: &Amount| -> MonetaryResult<Decimal> { Ok(a.number()) };
        assert_eq!(amount.query::<Decimal>(&number).unwrap(), dec!(4.2));
    }
}
