//! Append-only currency registry.

use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::currency::{CurrencyUnit, ISO_CURRENCIES};
use crate::error::{MonetaryError, MonetaryResult};

/// Interns currency units by code.
///
/// Registration is first-wins: once a code is present, later registrations
/// return the stored unit untouched. Safe to share across threads.
#[derive(Debug, Default)]
pub struct CurrencyRegistry {
    units: DashMap<String, CurrencyUnit>,
}

impl CurrencyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            units: DashMap::new(),
        }
    }

    /// Create a registry seeded with the bundled ISO 4217 currencies.
    pub fn with_iso_currencies() -> Self {
        let registry = Self::new();
        for (code, numeric, digits) in ISO_CURRENCIES {
            if let Ok(unit) = CurrencyUnit::new(*code, Some(*numeric), *digits) {
                registry.units.insert(code.to_string(), unit);
            }
        }
        registry
    }

    /// The process-wide default registry, seeded on first use.
    pub fn global() -> &'static CurrencyRegistry {
        static GLOBAL: OnceLock<CurrencyRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::with_iso_currencies)
    }

    /// Register a unit. Returns the interned instance for its code.
    pub fn register(&self, unit: CurrencyUnit) -> CurrencyUnit {
        let code = unit.code().to_string();
        let entry = self.units.entry(code).or_insert_with(|| {
            debug!(code = unit.code(), "Registered currency");
            unit
        });
        entry.value().clone()
    }

    /// Look up a unit by code.
    pub fn get(&self, code: &str) -> Option<CurrencyUnit> {
        self.units.get(code).map(|entry| entry.value().clone())
    }

    /// Look up a unit by code, failing if it is unknown.
    pub fn of(&self, code: &str) -> MonetaryResult<CurrencyUnit> {
        self.get(code)
            .ok_or_else(|| MonetaryError::UnknownCurrency(code.to_string()))
    }

    /// Check whether a code is registered.
    pub fn contains(&self, code: &str) -> bool {
        self.units.contains_key(code)
    }

    /// All registered codes, sorted.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.units.iter().map(|e| e.key().clone()).collect();
        codes.sort();
        codes
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Shared registry handle.
pub type SharedCurrencyRegistry = Arc<CurrencyRegistry>;
