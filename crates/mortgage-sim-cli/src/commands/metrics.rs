use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use mortgage_sim_core::time_value::{irr, npv, tcea};
use mortgage_sim_core::EngineSettings;

use crate::input;

/// Arguments for net present value
#[derive(Args)]
pub struct NpvArgs {
    /// Discount rate per period
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Decimal,

    /// Cash flows starting at period 0 (comma-separated, e.g. "1000,-350,-350,-350")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Path to a JSON or YAML array of cash flows
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for internal rate of return
#[derive(Args)]
pub struct IrrArgs {
    /// Cash flows starting at period 0 (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Path to a JSON or YAML array of cash flows
    #[arg(long)]
    pub input: Option<String>,

    /// Starting guess for the per-period rate
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub guess: Decimal,

    /// Periods per year; when given the IRR is also annualised (TCEA)
    #[arg(long)]
    pub periods_per_year: Option<Decimal>,
}

fn read_cash_flows(
    flags: Option<Vec<Decimal>>,
    path: Option<&str>,
) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::file::read_input(path);
    }
    if let Some(flows) = flags {
        return Ok(flows);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err("--cash-flows or --input is required".into())
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flows = read_cash_flows(args.cash_flows, args.input.as_deref())?;
    let value = npv(args.rate, &flows)?;
    Ok(json!({
        "result": {
            "npv": value,
            "rate": args.rate,
            "periods": flows.len().saturating_sub(1),
        }
    }))
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flows = read_cash_flows(args.cash_flows, args.input.as_deref())?;
    let rate = irr(&flows, args.guess, &EngineSettings::default())?;
    let annual = args
        .periods_per_year
        .map(|ppy| tcea(rate, ppy))
        .transpose()?;

    Ok(json!({
        "result": {
            "tcea": annual,
            "irr": rate,
            "periods": flows.len().saturating_sub(1),
        }
    }))
}
