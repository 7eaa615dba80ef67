//! Runtime configuration.

use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::context::{MathContext, RoundingMode, MAX_PRECISION};
use crate::rounding::DefaultRoundingProvider;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Defaults for contexts, roundings and logging.
#[derive(Debug, Clone)]
pub struct MonetaryConfig {
    /// Precision of the default math context.
    pub default_precision: u32,
    /// Rounding mode of the default math context.
    pub default_rounding: RoundingMode,
    /// Rounding mode used by currency roundings.
    pub currency_rounding: RoundingMode,
    /// Log output format.
    pub log_format: LogFormat,
    /// Log level.
    pub log_level: String,
}

impl Default for MonetaryConfig {
    fn default() -> Self {
        Self {
            default_precision: MathContext::DECIMAL64.precision,
            default_rounding: MathContext::DECIMAL64.rounding_mode,
            currency_rounding: RoundingMode::HalfUp,
            log_format: LogFormat::Text,
            log_level: "info".to_string(),
        }
    }
}

impl MonetaryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from environment variables, failing on the first
    /// unparseable value.
    pub fn try_from_env() -> Result<Self, String> {
        Self::try_from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Unparseable values
    /// are logged and keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let _ = config.apply(&lookup, |key, raw, reason| {
            warn!(key, value = raw, reason = %reason, "Ignoring unparseable configuration value");
            Ok(())
        });
        config
    }

    /// Load configuration from an arbitrary key lookup, failing on the first
    /// unparseable value.
    pub fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        config.apply(&lookup, |key, raw, reason| {
            Err(format!("Invalid value '{}' for {}: {}", raw, key, reason))
        })?;
        Ok(config)
    }

    fn apply(
        &mut self,
        lookup: &impl Fn(&str) -> Option<String>,
        on_error: impl Fn(&str, &str, String) -> Result<(), String>,
    ) -> Result<(), String> {
        if let Some(precision) = parse_var(lookup, "TENDER_DEFAULT_PRECISION", &on_error)? {
            self.default_precision = precision;
        }
        if let Some(mode) = parse_var(lookup, "TENDER_DEFAULT_ROUNDING", &on_error)? {
            self.default_rounding = mode;
        }
        if let Some(mode) = parse_var(lookup, "TENDER_CURRENCY_ROUNDING", &on_error)? {
            self.currency_rounding = mode;
        }
        if let Some(format) = parse_var(lookup, "TENDER_LOG_FORMAT", &on_error)? {
            self.log_format = format;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_precision > MAX_PRECISION {
            return Err(format!(
                "Default precision {} exceeds the supported maximum of {}",
                self.default_precision, MAX_PRECISION
            ));
        }

        if self.currency_rounding == RoundingMode::Unnecessary {
            return Err("Currency rounding cannot be UNNECESSARY".to_string());
        }

        if self.log_level.is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        Ok(())
    }

    /// The configured default math context.
    pub fn math_context(&self) -> MathContext {
        MathContext::new(self.default_precision, self.default_rounding)
    }

    /// A rounding provider using the configured currency rounding mode.
    pub fn rounding_provider(&self) -> DefaultRoundingProvider {
        DefaultRoundingProvider::new().with_mode(self.currency_rounding)
    }
}

/// Parse `key` if set. A value that fails to parse is passed to `on_error`
/// and treated as unset.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    on_error: &impl Fn(&str, &str, String) -> Result<(), String>,
) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.parse() {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            on_error(key, &raw, err.to_string())?;
            Ok(None)
        }
    }
}
