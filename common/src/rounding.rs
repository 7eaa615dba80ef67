//! Rounding providers and their aggregation.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::amount::{Amount, MonetaryAmount};
use crate::context::RoundingMode;
use crate::currency::CurrencyUnit;
use crate::error::{MonetaryError, MonetaryResult};
use crate::functions::{CashRounding, DefaultRounding};
use crate::operator::SharedOperator;

/// Source of rounding operators.
pub trait RoundingProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Standard rounding for a currency.
    fn rounding(&self, currency: &CurrencyUnit) -> Option<SharedOperator>;

    /// Rounding for a currency as it was valid at `timestamp`.
    fn rounding_at(
        &self,
        currency: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> Option<SharedOperator> {
        let _ = timestamp;
        self.rounding(currency)
    }

    /// Rounding to the smallest physical coin or note of a currency.
    fn cash_rounding(&self, currency: &CurrencyUnit) -> Option<SharedOperator>;

    fn cash_rounding_at(
        &self,
        currency: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> Option<SharedOperator> {
        let _ = timestamp;
        self.cash_rounding(currency)
    }

    /// A rounding registered under a free-form identifier.
    fn custom_rounding(&self, id: &str) -> Option<SharedOperator>;

    /// Identifiers accepted by [`custom_rounding`](Self::custom_rounding).
    fn custom_rounding_ids(&self) -> BTreeSet<String>;
}

/// Currency roundings from default fraction digits, plus registered cash
/// increments, historic overrides and custom roundings.
pub struct DefaultRoundingProvider {
    mode: RoundingMode,
    cash_increments: BTreeMap<String, Decimal>,
    historic: RwLock<BTreeMap<String, Vec<(DateTime<Utc>, SharedOperator)>>>,
    custom: RwLock<BTreeMap<String, SharedOperator>>,
}

impl DefaultRoundingProvider {
    /// Create a provider rounding half up, with the CHF 0.05 cash increment.
    pub fn new() -> Self {
        let mut cash_increments = BTreeMap::new();
        cash_increments.insert("CHF".to_string(), Decimal::new(5, 2));
        Self {
            mode: DefaultRounding::DEFAULT_MODE,
            cash_increments,
            historic: RwLock::new(BTreeMap::new()),
            custom: RwLock::new(BTreeMap::new()),
        }
    }

    /// Set the rounding mode for currency and cash roundings.
    pub fn with_mode(mut self, mode: RoundingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the smallest cash increment for a currency. The increment must be
    /// positive.
    pub fn with_cash_increment(
        mut self,
        code: impl Into<String>,
        increment: Decimal,
    ) -> MonetaryResult<Self> {
        let code = code.into();
        if increment <= Decimal::ZERO {
            return Err(MonetaryError::InvalidArgument(format!(
                "Cash increment for {} must be positive, got {}",
                code, increment
            )));
        }
        self.cash_increments.insert(code, increment);
        Ok(self)
    }

    pub fn mode(&self) -> RoundingMode {
        self.mode
    }

    /// Register a rounding under an identifier. Replaces any previous one.
    pub fn register_custom(&self, id: impl Into<String>, rounding: SharedOperator) {
        let id = id.into();
        debug!(id = %id, "Registered custom rounding");
        self.custom.write().insert(id, rounding);
    }

    /// Register a rounding that applied to `code` up to `valid_until`.
    pub fn register_historic_rounding(
        &self,
        code: impl Into<String>,
        valid_until: DateTime<Utc>,
        rounding: SharedOperator,
    ) {
        let mut historic = self.historic.write();
        let entries = historic.entry(code.into()).or_default();
        entries.push((valid_until, rounding));
        entries.sort_by_key(|(until, _)| *until);
    }
}

impl Default for DefaultRoundingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundingProvider for DefaultRoundingProvider {
    fn name(&self) -> &str {
        "DEFAULT"
    }

    fn rounding(&self, currency: &CurrencyUnit) -> Option<SharedOperator> {
        Some(Arc::new(DefaultRounding::of_currency_with_mode(
            currency, self.mode,
        )))
    }

    fn rounding_at(
        &self,
        currency: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> Option<SharedOperator> {
        let historic = self.historic.read();
        let past = historic.get(currency.code()).and_then(|entries| {
            entries
                .iter()
                .find(|(valid_until, _)| timestamp < *valid_until)
                .map(|(_, rounding)| rounding.clone())
        });
        past.or_else(|| self.rounding(currency))
    }

    fn cash_rounding(&self, currency: &CurrencyUnit) -> Option<SharedOperator> {
        match self.cash_increments.get(currency.code()) {
            Some(increment) => {
                let scale = currency.default_fraction_digits().max(increment.scale());
                match CashRounding::new(scale, *increment, self.mode) {
                    Ok(rounding) => Some(Arc::new(rounding) as SharedOperator),
                    Err(err) => {
                        warn!(currency = %currency, error = %err, "Invalid cash increment");
                        None
                    }
                }
            }
            None => self.rounding(currency),
        }
    }

    fn custom_rounding(&self, id: &str) -> Option<SharedOperator> {
        self.custom.read().get(id).cloned()
    }

    fn custom_rounding_ids(&self) -> BTreeSet<String> {
        self.custom.read().keys().cloned().collect()
    }
}

/// Queries a list of providers in order; the first hit wins.
#[derive(Clone)]
pub struct Roundings {
    providers: Vec<Arc<dyn RoundingProvider>>,
}

impl Roundings {
    /// Create an aggregate over the given providers.
    pub fn new(providers: Vec<Arc<dyn RoundingProvider>>) -> Self {
        Self { providers }
    }

    /// Append a provider with the lowest priority.
    pub fn with_provider(mut self, provider: Arc<dyn RoundingProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Provider names, in query order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    fn first_hit(
        &self,
        what: &str,
        key: &str,
        lookup: impl Fn(&dyn RoundingProvider) -> Option<SharedOperator>,
    ) -> MonetaryResult<SharedOperator> {
        for provider in &self.providers {
            if let Some(rounding) = lookup(provider.as_ref()) {
                debug!(provider = provider.name(), kind = what, key, "Rounding found");
                return Ok(rounding);
            }
        }
        warn!(kind = what, key, "No provider supplied a rounding");
        Err(MonetaryError::InvalidArgument(format!(
            "No {} rounding available for {}",
            what, key
        )))
    }

    pub fn rounding(&self, currency: &CurrencyUnit) -> MonetaryResult<SharedOperator> {
        self.first_hit("currency", currency.code(), |p| p.rounding(currency))
    }

    pub fn rounding_at(
        &self,
        currency: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> MonetaryResult<SharedOperator> {
        self.first_hit("currency", currency.code(), |p| p.rounding_at(currency, timestamp))
    }

    pub fn cash_rounding(&self, currency: &CurrencyUnit) -> MonetaryResult<SharedOperator> {
        self.first_hit("cash", currency.code(), |p| p.cash_rounding(currency))
    }

    pub fn cash_rounding_at(
        &self,
        currency: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> MonetaryResult<SharedOperator> {
        self.first_hit("cash", currency.code(), |p| {
            p.cash_rounding_at(currency, timestamp)
        })
    }

    pub fn custom_rounding(&self, id: &str) -> MonetaryResult<SharedOperator> {
        self.first_hit("custom", id, |p| p.custom_rounding(id))
    }

    /// Union of all providers' custom identifiers.
    pub fn custom_rounding_ids(&self) -> BTreeSet<String> {
        self.providers
            .iter()
            .flat_map(|p| p.custom_rounding_ids())
            .collect()
    }

    /// An operator that rounds every amount by its own currency.
    pub fn default_rounding(&self) -> SharedOperator {
        let roundings = self.clone();
        Arc::new(move |amount: Amount| {
            let rounding = roundings.rounding(amount.currency())?;
            rounding.apply(amount)
        })
    }
}

impl Default for Roundings {
    fn default() -> Self {
        Self::new(vec![Arc::new(DefaultRoundingProvider::new())])
    }
}
