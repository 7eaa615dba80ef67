//! Tender CLI
//!
//! Exact monetary arithmetic, rounding and currency conversion from the
//! command line.

use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tender_common::{LogFormat, MonetaryConfig};

mod commands;

use commands::{AmountKindArg, Operation, Report};

/// Tender CLI
#[derive(Parser, Debug)]
#[command(name = "tender")]
#[command(about = "Exact monetary arithmetic and currency conversion")]
struct Args {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine two numbers in one currency
    Calc {
        /// Left operand
        left: String,
        /// Operation to apply
        #[arg(value_enum)]
        op: Operation,
        /// Right operand (an amount for add/sub, a number otherwise)
        right: String,
        /// Currency code
        #[arg(short, long, default_value = "EUR")]
        currency: String,
        /// Amount representation
        #[arg(short, long, value_enum, default_value = "money")]
        kind: AmountKindArg,
    },

    /// Round an amount with a currency, cash or explicit rounding
    Round {
        /// Amount to round
        amount: String,
        /// Currency code
        #[arg(short, long, default_value = "EUR")]
        currency: String,
        /// Explicit number of fractional digits
        #[arg(long)]
        scale: Option<i32>,
        /// Rounding mode for an explicit scale (e.g. HALF_EVEN)
        #[arg(long)]
        mode: Option<String>,
        /// Round to the smallest cash unit instead
        #[arg(long)]
        cash: bool,
    },

    /// Convert an amount along one or more exchange rates
    Convert {
        /// Amount to convert
        amount: String,
        /// Rate link as BASE:TERM:FACTOR; repeat to build a chain
        #[arg(short, long = "rate", required = true)]
        rates: Vec<String>,
        /// Explicit factor for the composed rate
        #[arg(long)]
        factor: Option<String>,
        /// Round the result with the term currency's rounding
        #[arg(long)]
        round: bool,
        /// Amount representation
        #[arg(short, long, value_enum, default_value = "money")]
        kind: AmountKindArg,
    },
}

fn init_logging(config: &MonetaryConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    let config = MonetaryConfig::try_from_env()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    init_logging(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let args = Args::parse();
    debug!(command = ?args.command, "Running command");

    let report = match args.command {
        Command::Calc {
            left,
            op,
            right,
            currency,
            kind,
        } => commands::calc(&config, &left, op, &right, &currency, kind)?,
        Command::Round {
            amount,
            currency,
            scale,
            mode,
            cash,
        } => commands::round(&config, &amount, &currency, scale, mode.as_deref(), cash)?,
        Command::Convert {
            amount,
            rates,
            factor,
            round,
            kind,
        } => commands::convert(&config, &amount, &rates, factor.as_deref(), round, kind)?,
    };

    print(&report, args.json)
}

fn print(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for line in report.lines() {
            println!("{}", line);
        }
    }
    Ok(())
}
