use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use mortgage_sim_core::schedule::LoanInput;
use mortgage_sim_core::EngineSettings;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_settings(settings_json: Option<String>) -> NapiResult<EngineSettings> {
    match settings_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(EngineSettings::default()),
    }
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    value
        .trim()
        .parse()
        .map_err(|e| to_napi_error(format!("{field}: {e}")))
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_schedule(input_json: String, settings_json: Option<String>) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let settings = parse_settings(settings_json)?;
    let output = mortgage_sim_core::schedule::calculate_schedule_with(&input, &settings)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_report(input_json: String, settings_json: Option<String>) -> NapiResult<String> {
    let input: LoanInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let settings = parse_settings(settings_json)?;
    let output = mortgage_sim_core::schedule::calculate_schedule_with(&input, &settings)
        .map_err(to_napi_error)?;
    let report = mortgage_sim_core::report::build_report(&input, &output.result, None);
    let payments = mortgage_sim_core::report::payment_records(&output.result);
    serde_json::to_string(&serde_json::json!({
        "report": report,
        "payments": payments,
        "warnings": output.warnings,
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn simulate_batch(inputs_json: String, settings_json: Option<String>) -> NapiResult<String> {
    let inputs: Vec<LoanInput> = serde_json::from_str(&inputs_json).map_err(to_napi_error)?;
    let settings = parse_settings(settings_json)?;
    let outcomes: Vec<serde_json::Value> =
        mortgage_sim_core::schedule::batch::simulate_batch(&inputs, &settings)
            .into_iter()
            .map(|outcome| match outcome {
                Ok(output) => serde_json::json!({ "ok": output }),
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            })
            .collect();
    serde_json::to_string(&outcomes).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PeriodRateInput {
    effective_annual_rate: Decimal,
    frequency: String,
    #[serde(default = "default_days_in_year")]
    days_in_year: u32,
}

fn default_days_in_year() -> u32 {
    mortgage_sim_core::settings::DEFAULT_DAYS_IN_YEAR
}

#[napi]
pub fn period_rate(input_json: String) -> NapiResult<String> {
    let input: PeriodRateInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let frequency: mortgage_sim_core::PaymentFrequency =
        input.frequency.parse().map_err(to_napi_error)?;
    let rate = mortgage_sim_core::rates::frequency_period_rate(
        input.effective_annual_rate,
        frequency,
        input.days_in_year,
    )
    .map_err(to_napi_error)?;
    Ok(rate.to_string())
}

#[napi]
pub fn nominal_to_effective(nominal_rate: String, capitalization: String) -> NapiResult<String> {
    let nominal = parse_decimal("nominal_rate", &nominal_rate)?;
    let kind = mortgage_sim_core::rates::RateKind::Nominal { capitalization };
    let rate = kind
        .to_effective_annual(nominal, mortgage_sim_core::settings::DEFAULT_DAYS_IN_YEAR)
        .map_err(to_napi_error)?;
    Ok(rate.to_string())
}

// ---------------------------------------------------------------------------
// Cash-flow metrics
// ---------------------------------------------------------------------------

#[napi]
pub fn npv(rate: String, cash_flows_json: String) -> NapiResult<String> {
    let rate = parse_decimal("rate", &rate)?;
    let flows: Vec<Decimal> = serde_json::from_str(&cash_flows_json).map_err(to_napi_error)?;
    let value = mortgage_sim_core::time_value::npv(rate, &flows).map_err(to_napi_error)?;
    Ok(value.to_string())
}

#[napi]
pub fn irr(cash_flows_json: String, guess: Option<String>) -> NapiResult<String> {
    let flows: Vec<Decimal> = serde_json::from_str(&cash_flows_json).map_err(to_napi_error)?;
    let guess = match guess {
        Some(g) => parse_decimal("guess", &g)?,
        None => Decimal::ZERO,
    };
    let rate = mortgage_sim_core::time_value::irr(&flows, guess, &EngineSettings::default())
        .map_err(to_napi_error)?;
    Ok(rate.to_string())
}
