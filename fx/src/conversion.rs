//! Applying exchange rates to amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tender_common::{
    Amount, CurrencyUnit, MonetaryAmount, MonetaryError, MonetaryOperator, MonetaryResult,
};
use tracing::debug;

use crate::error::{FxError, FxResult};
use crate::rate::ExchangeRate;

impl ExchangeRate {
    /// Convert `amount` from the rate's base into its term currency.
    ///
    /// The result keeps the amount's representation, so its precision
    /// discipline applies to the product.
    pub fn apply<A: MonetaryAmount>(&self, amount: &A) -> FxResult<A> {
        if amount.currency() != self.base() {
            return Err(FxError::CurrencyMismatch {
                expected: self.base().code().to_string(),
                actual: amount.currency().code().to_string(),
            });
        }
        let converted = amount
            .with_currency(self.term().clone())
            .multiply_by(self.factor())?;
        debug!(
            input = %amount,
            output = %converted,
            factor = %self.factor(),
            "Converted amount"
        );
        Ok(converted)
    }

    /// Convert, then round the result with `rounding`.
    pub fn apply_rounded<A: MonetaryAmount>(
        &self,
        amount: &A,
        rounding: &dyn MonetaryOperator,
    ) -> FxResult<A> {
        Ok(self.apply(amount)?.with(rounding)?)
    }

    /// Convert and keep a record of input, output and rate.
    pub fn convert<A: MonetaryAmount>(&self, amount: &A) -> FxResult<Conversion> {
        let output = self.apply(amount)?;
        Ok(Conversion::new(
            amount.clone().into_amount(),
            output.into_amount(),
            self.clone(),
        ))
    }
}

/// A rate is an operator into its term currency.
impl MonetaryOperator for ExchangeRate {
    fn apply(&self, amount: Amount) -> MonetaryResult<Amount> {
        ExchangeRate::apply(self, &amount).map_err(|err| match err {
            FxError::Monetary(inner) => inner,
            FxError::CurrencyMismatch { expected, actual } => {
                MonetaryError::CurrencyMismatch { expected, actual }
            }
            other => MonetaryError::InvalidArgument(other.to_string()),
        })
    }
}

/// Represents a completed currency conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Input amount.
    pub input: Amount,
    /// Output amount.
    pub output: Amount,
    /// Rate used for conversion.
    pub rate: ExchangeRate,
}

impl Conversion {
    /// Create a new conversion record.
    pub fn new(input: Amount, output: Amount, rate: ExchangeRate) -> Self {
        Self {
            input,
            output,
            rate,
        }
    }

    /// Output over input. Zero when the input is zero.
    pub fn effective_rate(&self) -> FxResult<Decimal> {
        if self.input.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let (output, input) = (self.output.number(), self.input.number());
        output.checked_div(input).ok_or_else(|| {
            MonetaryError::ArithmeticOverflow(format!("effective rate {} / {}", output, input))
                .into()
        })
    }

    /// Source and target currency.
    pub fn pair(&self) -> (&CurrencyUnit, &CurrencyUnit) {
        (self.input.currency(), self.output.currency())
    }
}
