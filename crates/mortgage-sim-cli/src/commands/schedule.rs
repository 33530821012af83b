use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::debug;

use mortgage_sim_core::report::{build_report, payment_records};
use mortgage_sim_core::schedule::{
    calculate_schedule_with, GraceConfig, LoanInput, PeriodCountRounding, RateSource,
};
use mortgage_sim_core::EngineSettings;

use crate::input;

/// Loan parameters shared by `schedule` and `report`
#[derive(Args)]
pub struct LoanArgs {
    /// Path to a JSON or YAML loan file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Property price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment amount
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Housing bond applied against the price
    #[arg(long, default_value = "0")]
    pub bond: Decimal,

    /// Loan term in years
    #[arg(long)]
    pub years: Option<Decimal>,

    /// Loan term in months (takes priority over --years)
    #[arg(long)]
    pub months: Option<u32>,

    /// Payment frequency: DIARIA, QUINCENAL, MENSUAL, BIMESTRAL, TRIMESTRAL,
    /// CUATRIMESTRAL, SEMESTRAL, ANUAL
    #[arg(long, default_value = "MENSUAL")]
    pub frequency: String,

    /// Effective annual rate (TEA), e.g. 0.085
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Per-year rate curve (comma-separated), replaces --rate
    #[arg(long, value_delimiter = ',')]
    pub rates_per_year: Option<Vec<Decimal>>,

    /// Leading periods of total grace
    #[arg(long, default_value = "0")]
    pub grace_total: u32,

    /// Periods of partial grace after the total grace block
    #[arg(long, default_value = "0")]
    pub grace_partial: u32,

    /// Opportunity cost of capital (COK) as an effective annual rate
    #[arg(long, default_value = "0")]
    pub opportunity_rate: Decimal,

    /// Days-in-year convention (360 or 365)
    #[arg(long, default_value = "360")]
    pub days_in_year: u32,

    /// Round the period count to nearest instead of flooring it
    #[arg(long)]
    pub round_periods: bool,

    /// Upper bound on the number of schedule periods
    #[arg(long)]
    pub max_periods: Option<u32>,
}

impl LoanArgs {
    fn settings(&self) -> EngineSettings {
        let mut settings = EngineSettings::default();
        if let Some(max) = self.max_periods {
            settings.max_periods = max;
        }
        settings
    }

    fn to_loan_input(&self) -> Result<LoanInput, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return input::file::read_input(path);
        }
        if let Some(data) = input::stdin::read_stdin()? {
            return Ok(serde_json::from_value(data)?);
        }

        let price = self
            .price
            .ok_or("--price is required (or provide --input)")?;
        if self.years.is_none() && self.months.is_none() {
            return Err("--years or --months is required (or provide --input)".into());
        }
        let rates = match (&self.rates_per_year, self.rate) {
            (Some(curve), _) => RateSource::PerYear(curve.clone()),
            (None, Some(rate)) => RateSource::Flat(rate),
            (None, None) => return Err("--rate or --rates-per-year is required".into()),
        };

        let mut loan = LoanInput::new(
            price,
            self.down_payment,
            self.years.unwrap_or_default(),
            self.frequency.clone(),
            Decimal::ZERO,
        );
        loan.rates = rates;
        loan.term_months = self.months;
        loan.bond_amount = self.bond;
        loan.days_in_year = self.days_in_year;
        loan.opportunity_rate = self.opportunity_rate;
        loan.grace = GraceConfig {
            total_periods: self.grace_total,
            partial_periods: self.grace_partial,
        };
        if self.round_periods {
            loan.period_count_rounding = PeriodCountRounding::Round;
        }
        Ok(loan)
    }
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,
}

/// Arguments for the loan report
#[derive(Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Include one payment record per period
    #[arg(long)]
    pub payments: bool,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = args.loan.to_loan_input()?;
    debug!(frequency = %loan.frequency, "running schedule");
    let result = calculate_schedule_with(&loan, &args.loan.settings())?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = args.loan.to_loan_input()?;
    let output = calculate_schedule_with(&loan, &args.loan.settings())?;
    let report = build_report(&loan, &output.result, None);

    let mut value = json!({
        "result": report,
        "methodology": output.methodology,
        "warnings": output.warnings,
        "metadata": output.metadata,
    });
    if args.payments {
        value["payments"] = serde_json::to_value(payment_records(&output.result))?;
    }
    Ok(value)
}
