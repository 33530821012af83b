use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use mortgage_sim_core::rates::{effective_annual_to_period_rate, RateKind};
use mortgage_sim_core::PaymentFrequency;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum QuotedAs {
    /// Effective annual rate (TEA)
    Effective,
    /// Nominal annual rate (TNA)
    Nominal,
}

/// Arguments for rate conversion
#[derive(Args)]
pub struct ConvertRateArgs {
    /// Annual rate as a fraction, e.g. 0.12
    #[arg(long)]
    pub rate: Decimal,

    /// How the rate is quoted
    #[arg(long, value_enum, default_value = "effective")]
    pub quoted_as: QuotedAs,

    /// Capitalisation frequency code for nominal rates
    #[arg(long, default_value = "MENSUAL")]
    pub capitalization: String,

    /// Payment frequency code to convert into
    #[arg(long, default_value = "MENSUAL")]
    pub frequency: String,

    /// Days-in-year convention (360 or 365)
    #[arg(long, default_value = "360")]
    pub days_in_year: u32,
}

pub fn run_convert_rate(args: ConvertRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let frequency: PaymentFrequency = args.frequency.parse()?;
    let kind = match args.quoted_as {
        QuotedAs::Effective => RateKind::Effective,
        QuotedAs::Nominal => RateKind::Nominal {
            capitalization: args.capitalization.clone(),
        },
    };

    let effective_annual_rate = kind.to_effective_annual(args.rate, args.days_in_year)?;
    let period_rate =
        effective_annual_to_period_rate(effective_annual_rate, frequency.days(), args.days_in_year)?;

    Ok(json!({
        "result": {
            "quoted_rate": args.rate,
            "rate_kind": kind,
            "effective_annual_rate": effective_annual_rate,
            "frequency": frequency,
            "frequency_days": frequency.days(),
            "periods_per_year": frequency.periods_per_year(args.days_in_year),
            "period_rate": period_rate,
        }
    }))
}
