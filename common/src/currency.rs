//! Currency units.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{MonetaryError, MonetaryResult};

#[derive(Debug)]
struct CurrencyData {
    code: String,
    numeric_code: Option<u32>,
    default_fraction_digits: u32,
}

/// A currency, identified solely by its (case-sensitive) code.
///
/// Cloning is cheap; units handed out by a [`CurrencyRegistry`] share one
/// allocation per code.
///
/// [`CurrencyRegistry`]: crate::CurrencyRegistry
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "CurrencyRepr", into = "CurrencyRepr")]
pub struct CurrencyUnit(Arc<CurrencyData>);

impl CurrencyUnit {
    /// Create a currency unit.
    pub fn new(
        code: impl Into<String>,
        numeric_code: Option<u32>,
        default_fraction_digits: u32,
    ) -> MonetaryResult<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(MonetaryError::InvalidArgument(
                "Currency code must not be empty".to_string(),
            ));
        }
        Ok(Self(Arc::new(CurrencyData {
            code,
            numeric_code,
            default_fraction_digits,
        })))
    }

    /// Start building a currency unit.
    pub fn builder(code: impl Into<String>) -> CurrencyUnitBuilder {
        CurrencyUnitBuilder::new(code)
    }

    /// Currency code, e.g. `EUR`.
    pub fn code(&self) -> &str {
        &self.0.code
    }

    /// ISO 4217 numeric code, if the currency has one.
    pub fn numeric_code(&self) -> Option<u32> {
        self.0.numeric_code
    }

    /// Number of digits after the decimal point in the currency's minor unit.
    pub fn default_fraction_digits(&self) -> u32 {
        self.0.default_fraction_digits
    }

    /// Whether both handles point at the same interned unit.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for CurrencyUnit {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.code == other.0.code
    }
}

impl Eq for CurrencyUnit {}

impl Hash for CurrencyUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.code.hash(state);
    }
}

impl PartialOrd for CurrencyUnit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CurrencyUnit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.code.cmp(&other.0.code)
    }
}

impl fmt::Debug for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyUnit")
            .field("code", &self.0.code)
            .field("numeric_code", &self.0.numeric_code)
            .field("default_fraction_digits", &self.0.default_fraction_digits)
            .finish()
    }
}

impl fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.code)
    }
}

impl AsRef<str> for CurrencyUnit {
    fn as_ref(&self) -> &str {
        self.code()
    }
}

#[derive(Serialize, Deserialize)]
struct CurrencyRepr {
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    numeric_code: Option<u32>,
    default_fraction_digits: u32,
}

impl TryFrom<CurrencyRepr> for CurrencyUnit {
    type Error = MonetaryError;

    fn try_from(repr: CurrencyRepr) -> MonetaryResult<Self> {
        Self::new(repr.code, repr.numeric_code, repr.default_fraction_digits)
    }
}

impl From<CurrencyUnit> for CurrencyRepr {
    fn from(unit: CurrencyUnit) -> Self {
        Self {
            code: unit.0.code.clone(),
            numeric_code: unit.0.numeric_code,
            default_fraction_digits: unit.0.default_fraction_digits,
        }
    }
}

/// Builder for custom currency units.
#[derive(Debug, Clone)]
pub struct CurrencyUnitBuilder {
    code: String,
    numeric_code: Option<u32>,
    default_fraction_digits: u32,
}

impl CurrencyUnitBuilder {
    /// Create a builder for the given code, with two fraction digits and no
    /// numeric code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            numeric_code: None,
            default_fraction_digits: 2,
        }
    }

    /// Set the numeric code.
    pub fn numeric_code(mut self, numeric_code: u32) -> Self {
        self.numeric_code = Some(numeric_code);
        self
    }

    /// Set the default fraction digits.
    pub fn default_fraction_digits(mut self, digits: u32) -> Self {
        self.default_fraction_digits = digits;
        self
    }

    /// Build the unit without registering it anywhere.
    pub fn build(self) -> MonetaryResult<CurrencyUnit> {
        CurrencyUnit::new(self.code, self.numeric_code, self.default_fraction_digits)
    }

    /// Build the unit and register it, returning the registry's instance.
    ///
    /// If the code is already registered, the existing unit is returned.
    pub fn build_and_register(
        self,
        registry: &crate::CurrencyRegistry,
    ) -> MonetaryResult<CurrencyUnit> {
        Ok(registry.register(self.build()?))
    }
}

/// ISO 4217 seed data: `(code, numeric code, fraction digits)`.
pub(crate) const ISO_CURRENCIES: &[(&str, u32, u32)] = &[
    ("AED", 784, 2),
    ("ARS", 32, 2),
    ("AUD", 36, 2),
    ("BGN", 975, 2),
    ("BHD", 48, 3),
    ("BRL", 986, 2),
    ("CAD", 124, 2),
    ("CHF", 756, 2),
    ("CLP", 152, 0),
    ("CNY", 156, 2),
    ("COP", 170, 2),
    ("CZK", 203, 2),
    ("DKK", 208, 2),
    ("EGP", 818, 2),
    ("EUR", 978, 2),
    ("GBP", 826, 2),
    ("HKD", 344, 2),
    ("HUF", 348, 2),
    ("IDR", 360, 2),
    ("ILS", 376, 2),
    ("INR", 356, 2),
    ("ISK", 352, 0),
    ("JOD", 400, 3),
    ("JPY", 392, 0),
    ("KRW", 410, 0),
    ("KWD", 414, 3),
    ("MXN", 484, 2),
    ("MYR", 458, 2),
    ("NGN", 566, 2),
    ("NOK", 578, 2),
    ("NZD", 554, 2),
    ("OMR", 512, 3),
    ("PHP", 608, 2),
    ("PLN", 985, 2),
    ("RON", 946, 2),
    ("SAR", 682, 2),
    ("SEK", 752, 2),
    ("SGD", 702, 2),
    ("THB", 764, 2),
    ("TND", 788, 3),
    ("TRY", 949, 2),
    ("TWD", 901, 2),
    ("UAH", 980, 2),
    ("USD", 840, 2),
    ("VND", 704, 0),
    ("XAU", 959, 0),
    ("XXX", 999, 0),
    ("ZAR", 710, 2),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_code() {
        let a = CurrencyUnit::new("EUR", Some(978), 2).unwrap();
        let b = CurrencyUnit::new("EUR", None, 3).unwrap();
        let c = CurrencyUnit::new("eur", Some(978), 2).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_empty_code_rejected() {
        assert!(matches!(
            CurrencyUnit::new("", None, 2),
            Err(MonetaryError::InvalidArgument(_))
        ));
        assert!(CurrencyUnit::builder("  ").build().is_err());
    }

    #[test]
    fn test_builder() {
        let unit = CurrencyUnit::builder("cd")
            .default_fraction_digits(101)
            .numeric_code(7)
            .build()
            .unwrap();

        assert_eq!(unit.code(), "cd");
        assert_eq!(unit.default_fraction_digits(), 101);
        assert_eq!(unit.numeric_code(), Some(7));
    }

    #[test]
    fn test_serde_round_trip() {
        let unit = CurrencyUnit::new("BHD", Some(48), 3).unwrap();
        let json = serde_json::to_string(&unit).unwrap();
        assert_eq!(
            json,
            r#"{"code":"BHD","numeric_code":48,"default_fraction_digits":3}"#
        );

        let back: CurrencyUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, unit);
        assert_eq!(back.default_fraction_digits(), 3);
    }

    #[test]
    fn test_ordering_by_code() {
        let chf = CurrencyUnit::new("CHF", None, 2).unwrap();
        let usd = CurrencyUnit::new("USD", None, 2).unwrap();
        assert!(chf < usd);
    }
}
