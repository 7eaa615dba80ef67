//! Exchange rates, conversion contexts and the rate builder.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tender_common::{CurrencyUnit, MonetaryError};
use tracing::debug;

use crate::error::{FxError, FxResult};

/// How a rate was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateType {
    #[default]
    Any,
    Deferred,
    Historic,
    Realtime,
    Other,
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RateType::Any => "ANY",
            RateType::Deferred => "DEFERRED",
            RateType::Historic => "HISTORIC",
            RateType::Realtime => "REALTIME",
            RateType::Other => "OTHER",
        };
        f.write_str(name)
    }
}

/// Provenance of a rate: who supplied it, what kind it is and when it was
/// valid, plus free-form attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionContext {
    pub provider: String,
    pub rate_type: RateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ConversionContext {
    /// Create a context without timestamp or attributes.
    pub fn of(provider: impl Into<String>, rate_type: RateType) -> Self {
        Self {
            provider: provider.into(),
            rate_type,
            timestamp: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ConversionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.rate_type)
    }
}

/// A conversion factor from `base` to `term`.
///
/// A derived rate carries the chain of rates it was composed from, in
/// order: the first link starts at `base`, the last ends at `term`, and each
/// link's term is the next link's base. Deserialization enforces the same
/// chain rules as the builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ExchangeRateRepr", into = "ExchangeRateRepr")]
pub struct ExchangeRate {
    provider: String,
    rate_type: RateType,
    base: CurrencyUnit,
    term: CurrencyUnit,
    factor: Decimal,
    context: ConversionContext,
    chain: Vec<ExchangeRate>,
}

#[derive(Serialize, Deserialize)]
struct ExchangeRateRepr {
    provider: String,
    rate_type: RateType,
    base: CurrencyUnit,
    term: CurrencyUnit,
    factor: Decimal,
    context: ConversionContext,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    chain: Vec<ExchangeRate>,
}

impl TryFrom<ExchangeRateRepr> for ExchangeRate {
    type Error = FxError;

    fn try_from(repr: ExchangeRateRepr) -> FxResult<Self> {
        check_continuity(&repr.chain)?;
        check_endpoints(&repr.chain, &repr.base, &repr.term)?;
        Ok(Self {
            provider: repr.provider,
            rate_type: repr.rate_type,
            base: repr.base,
            term: repr.term,
            factor: repr.factor,
            context: repr.context,
            chain: repr.chain,
        })
    }
}

impl From<ExchangeRate> for ExchangeRateRepr {
    fn from(rate: ExchangeRate) -> Self {
        Self {
            provider: rate.provider,
            rate_type: rate.rate_type,
            base: rate.base,
            term: rate.term,
            factor: rate.factor,
            context: rate.context,
            chain: rate.chain,
        }
    }
}

impl ExchangeRate {
    /// Start building a rate; the context defaults to `provider`/`rate_type`.
    pub fn builder(provider: impl Into<String>, rate_type: RateType) -> ExchangeRateBuilder {
        ExchangeRateBuilder::new(provider, rate_type)
    }

    /// A builder pre-filled with this rate's fields.
    pub fn to_builder(&self) -> ExchangeRateBuilder {
        ExchangeRateBuilder {
            provider: self.provider.clone(),
            rate_type: self.rate_type,
            base: Some(self.base.clone()),
            term: Some(self.term.clone()),
            factor: Some(self.factor),
            context: Some(self.context.clone()),
            chain: self.chain.clone(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn rate_type(&self) -> RateType {
        self.rate_type
    }

    pub fn base(&self) -> &CurrencyUnit {
        &self.base
    }

    pub fn term(&self) -> &CurrencyUnit {
        &self.term
    }

    pub fn factor(&self) -> Decimal {
        self.factor
    }

    pub fn context(&self) -> &ConversionContext {
        &self.context
    }

    /// The rates this one was composed from; empty for a direct rate.
    pub fn chain(&self) -> &[ExchangeRate] {
        &self.chain
    }

    /// Whether this rate was composed from a chain.
    pub fn is_derived(&self) -> bool {
        !self.chain.is_empty()
    }

    /// Product of the chain's factors, if there is a chain.
    pub fn derived_factor(&self) -> Option<Decimal> {
        if self.chain.is_empty() {
            return None;
        }
        chain_product(&self.chain).ok()
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {} ({})",
            self.base, self.term, self.factor, self.context
        )
    }
}

fn chain_product(chain: &[ExchangeRate]) -> FxResult<Decimal> {
    chain.iter().try_fold(Decimal::ONE, |acc, rate| {
        acc.checked_mul(rate.factor).ok_or_else(|| {
            FxError::Monetary(MonetaryError::ArithmeticOverflow(format!(
                "{} * {}",
                acc, rate.factor
            )))
        })
    })
}

fn check_continuity(chain: &[ExchangeRate]) -> FxResult<()> {
    for (index, pair) in chain.windows(2).enumerate() {
        if pair[0].term != pair[1].base {
            return Err(FxError::InvalidChain {
                index: index + 1,
                reason: format!(
                    "term {} of the previous rate does not match base {}",
                    pair[0].term, pair[1].base
                ),
            });
        }
    }
    Ok(())
}

fn check_endpoints(
    chain: &[ExchangeRate],
    base: &CurrencyUnit,
    term: &CurrencyUnit,
) -> FxResult<()> {
    let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
        return Ok(());
    };
    if &first.base != base {
        return Err(FxError::InvalidChain {
            index: 0,
            reason: format!("chain starts at {}, rate base is {}", first.base, base),
        });
    }
    if &last.term != term {
        return Err(FxError::InvalidChain {
            index: chain.len() - 1,
            reason: format!("chain ends at {}, rate term is {}", last.term, term),
        });
    }
    Ok(())
}

/// Mutable builder for [`ExchangeRate`].
///
/// Setters return `&mut Self` for chaining. [`create`](Self::create) does not
/// consume the builder, so it can be adjusted and reused.
#[derive(Debug, Clone, Default)]
pub struct ExchangeRateBuilder {
    provider: String,
    rate_type: RateType,
    base: Option<CurrencyUnit>,
    term: Option<CurrencyUnit>,
    factor: Option<Decimal>,
    context: Option<ConversionContext>,
    chain: Vec<ExchangeRate>,
}

impl ExchangeRateBuilder {
    /// Create a builder whose context is seeded from `provider` and `rate_type`.
    pub fn new(provider: impl Into<String>, rate_type: RateType) -> Self {
        let provider = provider.into();
        Self {
            context: Some(ConversionContext::of(provider.clone(), rate_type)),
            provider,
            rate_type,
            ..Self::default()
        }
    }

    pub fn set_base(&mut self, base: CurrencyUnit) -> &mut Self {
        self.base = Some(base);
        self
    }

    pub fn set_term(&mut self, term: CurrencyUnit) -> &mut Self {
        self.term = Some(term);
        self
    }

    /// Set the factor explicitly. An explicit factor always wins over one
    /// derived from the chain.
    pub fn set_factor(&mut self, factor: Decimal) -> &mut Self {
        self.factor = Some(factor);
        self
    }

    pub fn set_context(&mut self, context: ConversionContext) -> &mut Self {
        self.context = Some(context);
        self
    }

    /// Set the chain of rates this rate is composed from.
    ///
    /// Consecutive links must connect; on failure the builder is unchanged.
    /// The factor is not touched here.
    pub fn set_rate_chain(
        &mut self,
        chain: impl IntoIterator<Item = ExchangeRate>,
    ) -> FxResult<&mut Self> {
        let chain: Vec<ExchangeRate> = chain.into_iter().collect();
        check_continuity(&chain)?;
        self.chain = chain;
        Ok(self)
    }

    /// Build the rate from the current builder state.
    pub fn create(&self) -> FxResult<ExchangeRate> {
        let base = self
            .base
            .clone()
            .ok_or(FxError::IncompleteRate { field: "base" })?;
        let term = self
            .term
            .clone()
            .ok_or(FxError::IncompleteRate { field: "term" })?;
        check_endpoints(&self.chain, &base, &term)?;

        let factor = match (self.factor, self.chain.is_empty()) {
            (Some(factor), _) => factor,
            (None, false) => {
                let derived = chain_product(&self.chain)?;
                debug!(
                    base = %base,
                    term = %term,
                    links = self.chain.len(),
                    factor = %derived,
                    "Derived factor from rate chain"
                );
                derived
            }
            (None, true) => return Err(FxError::IncompleteRate { field: "factor" }),
        };

        let context = self
            .context
            .clone()
            .ok_or(FxError::IncompleteRate { field: "context" })?;
        let context = self.aggregate_context(context);

        debug!(
            provider = %self.provider,
            base = %base,
            term = %term,
            factor = %factor,
            derived = !self.chain.is_empty(),
            "Created exchange rate"
        );

        Ok(ExchangeRate {
            provider: self.provider.clone(),
            rate_type: self.rate_type,
            base,
            term,
            factor,
            context,
            chain: self.chain.clone(),
        })
    }

    /// Merge link attributes under the builder's own and inherit the oldest
    /// link timestamp when none is set.
    fn aggregate_context(&self, mut context: ConversionContext) -> ConversionContext {
        if self.chain.is_empty() {
            return context;
        }
        let mut attributes = BTreeMap::new();
        for link in &self.chain {
            attributes.extend(link.context.attributes.clone());
        }
        attributes.extend(std::mem::take(&mut context.attributes));
        context.attributes = attributes;

        if context.timestamp.is_none() {
            context.timestamp = self
                .chain
                .iter()
                .filter_map(|link| link.context.timestamp)
                .min();
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tender_common::CurrencyRegistry;

    fn currency(code: &str) -> CurrencyUnit {
        CurrencyRegistry::global().of(code).unwrap()
    }

    fn rate(base: &str, term: &str, factor: Decimal) -> ExchangeRate {
        ExchangeRate::builder("test", RateType::Deferred)
            .set_base(currency(base))
            .set_term(currency(term))
            .set_factor(factor)
            .create()
            .unwrap()
    }

    #[test]
    fn test_setters_chain_on_same_builder() {
        let mut builder = ExchangeRate::builder("test", RateType::Deferred);
        let first: *const ExchangeRateBuilder = builder.set_base(currency("CHF"));
        let second: *const ExchangeRateBuilder = builder.set_term(currency("USD"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_explicit_factor_wins_over_chain() {
        let rate1 = rate("CHF", "EUR", dec!(0.8));
        let rate2 = rate("EUR", "USD", dec!(1.4));

        let mut builder = ExchangeRate::builder("test", RateType::Deferred);
        builder
            .set_base(currency("CHF"))
            .set_term(currency("USD"))
            .set_rate_chain([rate1.clone(), rate2.clone()])
            .unwrap()
            .set_factor(dec!(9))
            .set_context(ConversionContext::of("test", RateType::Deferred));
        let composed = builder.create().unwrap();

        assert_eq!(composed.factor(), dec!(9));
        assert_eq!(composed.chain(), &[rate1, rate2]);
        assert!(composed.is_derived());
        assert_eq!(composed.derived_factor(), Some(dec!(1.12)));
    }

    #[test]
    fn test_factor_derived_from_chain() {
        let rate1 = rate("CHF", "EUR", dec!(0.8));
        let rate2 = rate("EUR", "USD", dec!(1.4));

        let composed = ExchangeRate::builder("test", RateType::Deferred)
            .set_base(currency("CHF"))
            .set_term(currency("USD"))
            .set_rate_chain([rate1, rate2])
            .unwrap()
            .create()
            .unwrap();

        assert_eq!(composed.factor(), dec!(1.12));
    }

    #[test]
    fn test_leading_factor() {
        let mut builder = ExchangeRate::builder("test", RateType::Deferred);
        builder.set_factor(Decimal::from(i64::MAX));
        builder.set_factor(dec!(100));
        let created = builder
            .set_base(currency("CHF"))
            .set_term(currency("USD"))
            .create()
            .unwrap();
        assert_eq!(created.factor(), dec!(100));
    }

    #[test]
    fn test_builder_is_reusable() {
        let mut builder = ExchangeRate::builder("test", RateType::Realtime);
        builder
            .set_base(currency("EUR"))
            .set_term(currency("USD"))
            .set_factor(dec!(1.1));
        let first = builder.create().unwrap();

        builder.set_term(currency("GBP")).set_factor(dec!(0.85));
        let second = builder.create().unwrap();

        assert_eq!(first.term().code(), "USD");
        assert_eq!(second.term().code(), "GBP");
        assert_eq!(second.factor(), dec!(0.85));
        assert_eq!(builder.create().unwrap(), second);
    }

    #[test]
    fn test_missing_fields() {
        let mut builder = ExchangeRate::builder("test", RateType::Deferred);
        assert_eq!(
            builder.create(),
            Err(FxError::IncompleteRate { field: "base" })
        );
        builder.set_base(currency("EUR"));
        assert_eq!(
            builder.create(),
            Err(FxError::IncompleteRate { field: "term" })
        );
        builder.set_term(currency("USD"));
        assert_eq!(
            builder.create(),
            Err(FxError::IncompleteRate { field: "factor" })
        );

        let mut bare = ExchangeRateBuilder::default();
        bare.set_base(currency("EUR"))
            .set_term(currency("USD"))
            .set_factor(dec!(1));
        assert_eq!(
            bare.create(),
            Err(FxError::IncompleteRate { field: "context" })
        );
    }

    #[test]
    fn test_discontinuous_chain_rejected() {
        let rate1 = rate("CHF", "EUR", dec!(0.8));
        let rate2 = rate("GBP", "USD", dec!(1.3));

        let mut builder = ExchangeRate::builder("test", RateType::Deferred);
        let result = builder.set_rate_chain([rate1, rate2]).map(|_| ());
        assert!(matches!(result, Err(FxError::InvalidChain { index: 1, .. })));
        assert!(builder.set_rate_chain(Vec::new()).is_ok());
    }

    #[test]
    fn test_chain_endpoints_checked() {
        let rate1 = rate("CHF", "EUR", dec!(0.8));
        let rate2 = rate("EUR", "USD", dec!(1.4));

        let mut builder = ExchangeRate::builder("test", RateType::Deferred);
        builder
            .set_base(currency("GBP"))
            .set_term(currency("USD"))
            .set_rate_chain([rate1, rate2])
            .unwrap();
        assert!(matches!(
            builder.create(),
            Err(FxError::InvalidChain { index: 0, .. })
        ));
    }

    #[test]
    fn test_same_base_and_term_keeps_factor() {
        let created = rate("EUR", "EUR", dec!(1.05));
        assert_eq!(created.factor(), dec!(1.05));
    }

    #[test]
    fn test_context_aggregation() {
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let rate1 = ExchangeRate::builder("ecb", RateType::Historic)
            .set_base(currency("CHF"))
            .set_term(currency("EUR"))
            .set_factor(dec!(0.8))
            .set_context(
                ConversionContext::of("ecb", RateType::Historic)
                    .with_timestamp(newer)
                    .with_attribute("source", "ecb")
                    .with_attribute("desk", "zurich"),
            )
            .create()
            .unwrap();
        let rate2 = ExchangeRate::builder("imf", RateType::Historic)
            .set_base(currency("EUR"))
            .set_term(currency("USD"))
            .set_factor(dec!(1.4))
            .set_context(
                ConversionContext::of("imf", RateType::Historic)
                    .with_timestamp(older)
                    .with_attribute("source", "imf"),
            )
            .create()
            .unwrap();

        let composed = ExchangeRate::builder("chain", RateType::Historic)
            .set_base(currency("CHF"))
            .set_term(currency("USD"))
            .set_rate_chain([rate1, rate2])
            .unwrap()
            .set_context(
                ConversionContext::of("chain", RateType::Historic).with_attribute("desk", "london"),
            )
            .create()
            .unwrap();

        let context = composed.context();
        assert_eq!(context.timestamp, Some(older));
        assert_eq!(context.attributes.get("source").map(String::as_str), Some("imf"));
        assert_eq!(context.attributes.get("desk").map(String::as_str), Some("london"));
    }

    #[test]
    fn test_serde_round_trip() {
        let rate1 = rate("CHF", "EUR", dec!(0.8));
        let rate2 = rate("EUR", "USD", dec!(1.4));
        let composed = ExchangeRate::builder("test", RateType::Deferred)
            .set_base(currency("CHF"))
            .set_term(currency("USD"))
            .set_rate_chain([rate1, rate2])
            .unwrap()
            .create()
            .unwrap();

        let json = serde_json::to_string(&composed).unwrap();
        let back: ExchangeRate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, composed);
        assert_eq!(back.chain().len(), 2);
    }

    #[test]
    fn test_deserialize_rejects_broken_chain() {
        let composed = ExchangeRate::builder("test", RateType::Deferred)
            .set_base(currency("CHF"))
            .set_term(currency("USD"))
            .set_rate_chain([rate("CHF", "EUR", dec!(0.8)), rate("EUR", "USD", dec!(1.4))])
            .unwrap()
            .create()
            .unwrap();
        let json = serde_json::to_value(&composed).unwrap();

        let mut gap = json.clone();
        gap["chain"][0]["term"] = serde_json::to_value(currency("GBP")).unwrap();
        assert!(serde_json::from_value::<ExchangeRate>(gap).is_err());

        let mut detached = json.clone();
        detached["base"] = serde_json::to_value(currency("SEK")).unwrap();
        assert!(serde_json::from_value::<ExchangeRate>(detached).is_err());

        let mut direct = json;
        direct.as_object_mut().unwrap().remove("chain");
        let direct: ExchangeRate = serde_json::from_value(direct).unwrap();
        assert!(!direct.is_derived());
    }

    #[test]
    fn test_to_builder() {
        let original = rate("EUR", "USD", dec!(1.1));
        let adjusted = original.to_builder().set_factor(dec!(1.2)).create().unwrap();
        assert_eq!(adjusted.base(), original.base());
        assert_eq!(adjusted.factor(), dec!(1.2));
    }
}
