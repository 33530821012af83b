use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::MortgageSimError;
use crate::rates::effective_annual_to_period_rate;
use crate::settings::EngineSettings;
use crate::types::*;
use crate::MortgageSimResult;

use super::amortization::amortize;
use super::cash_flows::{cash_flow_vector, compute_metrics, disbursement_cash_flow};
use super::loan::LoanInput;
use super::overlay::{overlay, OverlayContext, ScheduleRow};
use super::periods::build_period_plan;

/// Complete output of one loan simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub price: Money,
    pub down_payment: Money,
    pub bond_applied: Money,
    /// Price net of down payment and bond (C)
    pub financed_capital: Money,
    /// Sum of the one-time initial costs
    pub initial_costs: Money,
    /// Initial costs added to the loan balance (zero unless capitalised)
    pub capitalized_costs: Money,
    /// Balance entering period 1
    pub principal: Money,
    pub frequency: PaymentFrequency,
    pub frequency_days: u32,
    pub days_in_year: u32,
    pub periods_per_year: Decimal,
    pub total_periods: u32,
    pub rows: Vec<ScheduleRow>,
    /// `[CF0, CF1, ..., CFN]` under the chosen perspective
    pub cash_flows: Vec<Money>,
    pub total_installments: Money,
    pub total_amortization: Money,
    /// Interest accrued, including interest capitalised during TOTAL grace
    pub total_interest: Money,
    /// Interest actually paid (installments minus amortization)
    pub total_interest_paid: Money,
    pub total_life_insurance: Money,
    pub total_risk_insurance: Money,
    /// Commission, charges and admin expense over the whole term
    pub total_periodic_fees: Money,
    pub total_payments: Money,
    pub opportunity_period_rate: Rate,
    /// Net present value (VAN) at the opportunity period rate
    pub npv: Money,
    /// Internal rate of return per period (TIR)
    pub irr: Rate,
    /// Total effective annual cost (TCEA)
    pub tcea: Rate,
}

/// Run the full pipeline with default engine settings.
pub fn calculate_schedule(input: &LoanInput) -> MortgageSimResult<ComputationOutput<ScheduleResult>> {
    calculate_schedule_with(input, &EngineSettings::default())
}

/// Build the amortization schedule, price it and derive NPV, IRR and TCEA.
pub fn calculate_schedule_with(
    input: &LoanInput,
    settings: &EngineSettings,
) -> MortgageSimResult<ComputationOutput<ScheduleResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let plan = build_period_plan(input, settings, &mut warnings)?;

    let financed_capital = input.financed_capital();
    let initial_costs = round2(input.initial_costs.total());
    let capitalized_costs = if input.capitalize_initial_costs {
        initial_costs
    } else {
        Decimal::ZERO
    };
    let principal = financed_capital + capitalized_costs;

    if financed_capital.is_zero() {
        let msg = "Down payment and bond cover the full price; nothing is financed".to_string();
        warn!("{msg}");
        warnings.push(msg);
    }
    if principal <= Decimal::ZERO {
        return Err(MortgageSimError::InvalidInput {
            field: "price".into(),
            reason: "Financed principal must be positive".into(),
        });
    }

    let amortized = amortize(principal, &plan.slots)?;
    debug!(periods = amortized.len(), %principal, "schedule amortized");

    if !plan.slots.iter().any(|s| s.grace_type == GraceType::SinPlazo) {
        let msg = "No amortising (SIN_PLAZO) periods; the balance is never repaid".to_string();
        warn!("{msg}");
        warnings.push(msg);
    }

    let ctx = OverlayContext {
        costs: &input.periodic_costs,
        basis: input.insurance_basis,
        periods_per_year: plan.periods_per_year,
        perspective: input.perspective,
        frequency_days: plan.frequency.days(),
        disbursement_date: input.disbursement_date,
    };
    let rows = overlay(amortized, &ctx);

    let disbursement = disbursement_cash_flow(
        financed_capital,
        initial_costs,
        input.capitalize_initial_costs,
        input.perspective,
    );
    let cash_flows = cash_flow_vector(disbursement, &rows);

    let opportunity_period_rate = effective_annual_to_period_rate(
        input.opportunity_rate,
        plan.frequency.days(),
        plan.days_in_year,
    )?;
    let metrics = compute_metrics(
        &cash_flows,
        opportunity_period_rate,
        plan.periods_per_year,
        settings,
    )?;

    let total_installments: Money = rows.iter().map(|r| r.installment).sum();
    let total_amortization: Money = rows.iter().map(|r| r.amortization).sum();
    let total_interest: Money = rows.iter().map(|r| r.interest).sum();
    let total_life_insurance: Money = rows.iter().map(|r| r.life_insurance).sum();
    let total_risk_insurance: Money = rows.iter().map(|r| r.risk_insurance).sum();
    let total_periodic_fees: Money = rows
        .iter()
        .map(|r| r.commission + r.charges + r.admin_expense)
        .sum();
    let total_payments: Money = rows.iter().map(|r| r.total_payment).sum();

    let output = ScheduleResult {
        price: input.price,
        down_payment: round2(input.down_payment),
        bond_applied: round2(input.bond_amount),
        financed_capital,
        initial_costs,
        capitalized_costs,
        principal,
        frequency: plan.frequency,
        frequency_days: plan.frequency.days(),
        days_in_year: plan.days_in_year,
        periods_per_year: plan.periods_per_year,
        total_periods: plan.total_periods,
        rows,
        cash_flows,
        total_installments: round2(total_installments),
        total_amortization: round2(total_amortization),
        total_interest: round2(total_interest),
        total_interest_paid: round2(total_installments - total_amortization),
        total_life_insurance: round2(total_life_insurance),
        total_risk_insurance: round2(total_risk_insurance),
        total_periodic_fees: round2(total_periodic_fees),
        total_payments: round2(total_payments),
        opportunity_period_rate: metrics.opportunity_period_rate,
        npv: metrics.npv,
        irr: metrics.irr,
        tcea: metrics.tcea,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "French Amortization Schedule with Cost Overlay",
        &serde_json::json!({
            "frequency": plan.frequency.code(),
            "days_in_year": plan.days_in_year,
            "total_periods": plan.total_periods,
            "rate_kind": input.rate_kind,
            "period_count_rounding": input.period_count_rounding,
            "insurance_basis": input.insurance_basis,
            "perspective": input.perspective,
            "capitalize_initial_costs": input.capitalize_initial_costs,
            "opportunity_rate": input.opportunity_rate.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &LoanInput) -> MortgageSimResult<()> {
    let non_negative = [
        ("price", input.price),
        ("down_payment", input.down_payment),
        ("bond_amount", input.bond_amount),
        ("initial_costs.notary", input.initial_costs.notary),
        ("initial_costs.registry", input.initial_costs.registry),
        ("initial_costs.appraisal", input.initial_costs.appraisal),
        ("initial_costs.study_commission", input.initial_costs.study_commission),
        (
            "initial_costs.activation_commission",
            input.initial_costs.activation_commission,
        ),
        ("periodic_costs.commission", input.periodic_costs.commission),
        ("periodic_costs.charges", input.periodic_costs.charges),
        ("periodic_costs.admin_expense", input.periodic_costs.admin_expense),
        (
            "periodic_costs.life_insurance_annual_rate",
            input.periodic_costs.life_insurance_annual_rate,
        ),
        (
            "periodic_costs.risk_insurance_annual_rate",
            input.periodic_costs.risk_insurance_annual_rate,
        ),
    ];

    for (field, value) in non_negative {
        if value < Decimal::ZERO {
            return Err(MortgageSimError::InvalidInput {
                field: field.into(),
                reason: "Must not be negative".into(),
            });
        }
    }

    if input.opportunity_rate <= Decimal::NEGATIVE_ONE {
        return Err(MortgageSimError::InvalidInput {
            field: "opportunity_rate".into(),
            reason: "Opportunity rate must be greater than -100%".into(),
        });
    }

    Ok(())
}
