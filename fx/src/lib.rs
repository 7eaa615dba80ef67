//! Tender FX
//!
//! Exchange rates between currency units and their composition.
//!
//! # Features
//!
//! - Exchange rates with provenance (`ConversionContext`)
//! - Rate chains composed into a single effective rate
//! - Conversion of any amount representation, optionally rounded
//!
//! # Example
//!
//! ```rust,ignore
//! use tender_common::{CurrencyRegistry, Money, MonetaryAmount};
//! use tender_fx::{ExchangeRate, RateType};
//!
//! let registry = CurrencyRegistry::global();
//! let chf_eur = ExchangeRate::builder("ecb", RateType::Deferred)
//!     .set_base(registry.of("CHF")?)
//!     .set_term(registry.of("EUR")?)
//!     .set_factor(dec!(0.8))
//!     .create()?;
//!
//! let eur = chf_eur.apply(&Money::of(registry.of("CHF")?, 100)?)?;
//! ```

pub mod conversion;
pub mod error;
pub mod rate;

pub use conversion::Conversion;
pub use error::{FxError, FxResult};
pub use rate::{ConversionContext, ExchangeRate, ExchangeRateBuilder, RateType};
