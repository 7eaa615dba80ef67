//! Subcommand implementations.

use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use tender_common::{
    Amount, CurrencyRegistry, CurrencyUnit, DefaultRounding, FastMoney, Money, MonetaryAmount,
    MonetaryConfig, RoundedMoney, RoundingMode, Roundings, SharedOperator, ToDecimal,
};
use tender_fx::{ExchangeRate, RateType};

/// Arithmetic operation for `calc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Divrem,
}

/// Amount representation selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AmountKindArg {
    #[default]
    Money,
    Rounded,
    Fast,
}

/// Command output.
#[derive(Debug, Serialize)]
pub struct Report {
    pub results: Vec<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<ExchangeRate>,
}

impl Report {
    /// Human-readable lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.results.iter().map(ToString::to_string).collect();
        if let Some(rate) = &self.rate {
            lines.push(format!("rate: {}", rate));
        }
        lines
    }
}

fn currency(code: &str) -> anyhow::Result<CurrencyUnit> {
    CurrencyRegistry::global()
        .of(code)
        .with_context(|| format!("Cannot use currency '{}'", code))
}

fn roundings(config: &MonetaryConfig) -> Roundings {
    Roundings::new(vec![Arc::new(config.rounding_provider())])
}

fn make_amount(
    config: &MonetaryConfig,
    kind: AmountKindArg,
    currency: CurrencyUnit,
    value: &str,
) -> anyhow::Result<Amount> {
    let amount = match kind {
        AmountKindArg::Money => Money::of(currency, value)?.into_amount(),
        AmountKindArg::Rounded => {
            RoundedMoney::of_with_context(currency, value, config.math_context())?.into_amount()
        }
        AmountKindArg::Fast => FastMoney::of(currency, value)?.into_amount(),
    };
    Ok(amount)
}

#[instrument(skip(config))]
pub fn calc(
    config: &MonetaryConfig,
    left: &str,
    op: Operation,
    right: &str,
    code: &str,
    kind: AmountKindArg,
) -> anyhow::Result<Report> {
    let unit = currency(code)?;
    let left = make_amount(config, kind, unit.clone(), left)?;

    let results = match op {
        Operation::Add => vec![left.add(&make_amount(config, kind, unit, right)?)?],
        Operation::Sub => vec![left.subtract(&make_amount(config, kind, unit, right)?)?],
        Operation::Mul => vec![left.multiply_by(right)?],
        Operation::Div => vec![left.divide_by(right)?],
        Operation::Rem => vec![left.remainder_by(right)?],
        Operation::Divrem => {
            let (quotient, remainder) = left.divide_and_remainder_by(right)?;
            vec![quotient, remainder]
        }
    };

    debug!(op = ?op, left = %left, right, "Calculated");
    Ok(Report {
        results,
        rate: None,
    })
}

#[instrument(skip(config))]
pub fn round(
    config: &MonetaryConfig,
    value: &str,
    code: &str,
    scale: Option<i32>,
    mode: Option<&str>,
    cash: bool,
) -> anyhow::Result<Report> {
    let unit = currency(code)?;
    let amount = Money::of(unit.clone(), value)?;
    let roundings = roundings(config);

    let rounding: SharedOperator = match (scale, cash) {
        (Some(_), true) => bail!("--scale and --cash cannot be combined"),
        (Some(scale), false) => {
            let mode = match mode {
                Some(mode) => mode.parse::<RoundingMode>()?,
                None => config.currency_rounding,
            };
            Arc::new(DefaultRounding::new(scale, mode))
        }
        (None, true) => roundings.cash_rounding(&unit)?,
        (None, false) => roundings.rounding(&unit)?,
    };

    Ok(Report {
        results: vec![amount.with(rounding.as_ref())?.into_amount()],
        rate: None,
    })
}

/// Parse a `BASE:TERM:FACTOR` rate link.
fn parse_rate(link: &str) -> anyhow::Result<ExchangeRate> {
    let parts: Vec<&str> = link.split(':').collect();
    let [base, term, factor] = parts.as_slice() else {
        bail!("Rate '{}' is not of the form BASE:TERM:FACTOR", link);
    };
    let rate = ExchangeRate::builder("cli", RateType::Other)
        .set_base(currency(base)?)
        .set_term(currency(term)?)
        .set_factor(factor.to_decimal()?)
        .create()?;
    Ok(rate)
}

#[instrument(skip(config))]
pub fn convert(
    config: &MonetaryConfig,
    value: &str,
    rates: &[String],
    factor: Option<&str>,
    round: bool,
    kind: AmountKindArg,
) -> anyhow::Result<Report> {
    let links = rates
        .iter()
        .map(|link| parse_rate(link))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let (Some(first), Some(last)) = (links.first(), links.last()) else {
        bail!("At least one --rate is required");
    };

    let rate = if links.len() == 1 && factor.is_none() {
        first.clone()
    } else {
        let mut builder = ExchangeRate::builder("cli", RateType::Other);
        builder
            .set_base(first.base().clone())
            .set_term(last.term().clone())
            .set_rate_chain(links.clone())?;
        if let Some(factor) = factor {
            builder.set_factor(factor.to_decimal()?);
        }
        builder.create()?
    };

    let amount = make_amount(config, kind, rate.base().clone(), value)?;
    let output = if round {
        let rounding = roundings(config).rounding(rate.term())?;
        rate.apply_rounded(&amount, rounding.as_ref())?
    } else {
        rate.apply(&amount)?
    };

    info!(input = %amount, output = %output, factor = %rate.factor(), "Converted");
    Ok(Report {
        results: vec![amount, output],
        rate: Some(rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(report: &Report) -> Vec<String> {
        report.results.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_calc_add() {
        let config = MonetaryConfig::default();
        let report = calc(&config, "10", Operation::Add, "1", "EUR", AmountKindArg::Money).unwrap();
        assert_eq!(texts(&report), vec!["11 EUR"]);
    }

    #[test]
    fn test_calc_divrem() {
        let config = MonetaryConfig::default();
        let report =
            calc(&config, "1000", Operation::Divrem, "11", "EUR", AmountKindArg::Fast).unwrap();
        assert_eq!(texts(&report), vec!["90 EUR", "10 EUR"]);
    }

    #[test]
    fn test_calc_rejects_bad_input() {
        let config = MonetaryConfig::default();
        assert!(calc(&config, "ten", Operation::Add, "1", "EUR", AmountKindArg::Money).is_err());
        assert!(calc(&config, "1", Operation::Div, "0", "EUR", AmountKindArg::Money).is_err());
        assert!(calc(&config, "1", Operation::Add, "1", "XYZ", AmountKindArg::Money).is_err());
    }

    #[test]
    fn test_round() {
        let config = MonetaryConfig::default();
        let report = round(&config, "10.005", "EUR", None, None, false).unwrap();
        assert_eq!(texts(&report), vec!["10.01 EUR"]);

        let report = round(&config, "10.005", "EUR", Some(2), Some("HALF_EVEN"), false).unwrap();
        assert_eq!(texts(&report), vec!["10 EUR"]);

        let report = round(&config, "1.23", "CHF", None, None, true).unwrap();
        assert_eq!(texts(&report), vec!["1.25 CHF"]);

        assert!(round(&config, "1", "EUR", Some(2), None, true).is_err());
    }

    #[test]
    fn test_convert_chain() {
        let config = MonetaryConfig::default();
        let rates = vec!["CHF:EUR:0.8".to_string(), "EUR:USD:1.4".to_string()];

        let report = convert(&config, "100", &rates, None, false, AmountKindArg::Money).unwrap();
        assert_eq!(report.results[1].to_string(), "112 USD");
        assert!(report.rate.as_ref().unwrap().is_derived());

        let report =
            convert(&config, "100", &rates, Some("9"), false, AmountKindArg::Money).unwrap();
        assert_eq!(report.results[1].to_string(), "900 USD");
    }

    #[test]
    fn test_convert_rounded() {
        let config = MonetaryConfig::default();
        let rates = vec!["EUR:JPY:161.237".to_string()];
        let report = convert(&config, "3.5", &rates, None, true, AmountKindArg::Money).unwrap();
        assert_eq!(report.results[1].to_string(), "564 JPY");
    }

    #[test]
    fn test_convert_rejects_bad_rate() {
        let config = MonetaryConfig::default();
        let rates = vec!["CHF-EUR-0.8".to_string()];
        assert!(convert(&config, "1", &rates, None, false, AmountKindArg::Money).is_err());

        let rates = vec!["CHF:EUR:0.8".to_string(), "USD:GBP:0.8".to_string()];
        assert!(convert(&config, "1", &rates, None, false, AmountKindArg::Money).is_err());
    }

    #[test]
    fn test_report_json() {
        let config = MonetaryConfig::default();
        let report = calc(&config, "2.5", Operation::Mul, "2", "EUR", AmountKindArg::Fast).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["type"], "Fast");
        assert!(json.get("rate").is_none());
    }
}
