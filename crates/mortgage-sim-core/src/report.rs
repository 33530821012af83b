//! Flat records handed to persistence and report rendering.
//!
//! These are projections of a finished [`ScheduleResult`]; nothing here
//! recomputes the schedule. Percentages appear only at this boundary.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::schedule::{LoanInput, ScheduleResult};
use crate::types::*;

/// Summary of one simulation, one record per calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<NaiveDateTime>,
    pub currency: Currency,
    pub price: Money,
    pub down_payment: Money,
    pub bond_applied: Money,
    pub years: Years,
    pub frequency: String,
    pub total_periods: u32,
    /// First annual rate of the curve, as quoted
    pub base_tea: Rate,
    pub notary: Money,
    pub registry: Money,
    pub appraisal: Money,
    pub study_commission: Money,
    pub activation_commission: Money,
    pub commission: Money,
    pub charges: Money,
    pub admin_expense: Money,
    pub life_insurance_annual_rate: Rate,
    pub risk_insurance_annual_rate: Rate,
    /// Opportunity cost of capital (COK) as an effective annual rate
    pub opportunity_tea: Rate,
    pub financed_capital: Money,
    pub total_installments_paid: Money,
    pub total_amortization: Money,
    pub total_interest: Money,
    pub total_payments: Money,
    /// Net present value, to the cent
    pub van: Money,
    /// Internal rate of return per period, in percent
    pub tir_pct: Decimal,
    /// Total effective annual cost, in percent
    pub tcea_pct: Decimal,
}

/// Per-period record in the shape a payments store keeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    /// Everything the borrower pays this period
    pub payment_amount: Money,
    pub capital_amortization: Money,
    /// Interest settled in cash; zero while interest capitalises
    pub interest_paid: Money,
    pub effective_rate_period: Rate,
    pub grace_type: GraceType,
    pub remaining_balance: Money,
}

fn to_pct(rate: Rate, dp: u32) -> Decimal {
    (rate * dec!(100)).round_dp(dp)
}

/// Summarise a finished simulation for storage or display.
pub fn build_report(
    input: &LoanInput,
    result: &ScheduleResult,
    generated_at: Option<NaiveDateTime>,
) -> LoanReport {
    LoanReport {
        generated_at,
        currency: input.currency.clone(),
        price: result.price,
        down_payment: result.down_payment,
        bond_applied: result.bond_applied,
        years: input.term_years(),
        frequency: result.frequency.code().to_string(),
        total_periods: result.total_periods,
        base_tea: input.rates.base_rate().unwrap_or_default(),
        notary: input.initial_costs.notary,
        registry: input.initial_costs.registry,
        appraisal: input.initial_costs.appraisal,
        study_commission: input.initial_costs.study_commission,
        activation_commission: input.initial_costs.activation_commission,
        commission: input.periodic_costs.commission,
        charges: input.periodic_costs.charges,
        admin_expense: input.periodic_costs.admin_expense,
        life_insurance_annual_rate: input.periodic_costs.life_insurance_annual_rate,
        risk_insurance_annual_rate: input.periodic_costs.risk_insurance_annual_rate,
        opportunity_tea: input.opportunity_rate,
        financed_capital: result.financed_capital,
        total_installments_paid: result.total_installments,
        total_amortization: result.total_amortization,
        total_interest: result.total_interest,
        total_payments: result.total_payments,
        van: round2(result.npv),
        tir_pct: to_pct(result.irr, 7),
        tcea_pct: to_pct(result.tcea, 7),
    }
}

/// One payment record per schedule row.
pub fn payment_records(result: &ScheduleResult) -> Vec<PaymentRecord> {
    result
        .rows
        .iter()
        .map(|row| PaymentRecord {
            period: row.period,
            payment_date: row.payment_date,
            payment_amount: row.total_payment,
            capital_amortization: row.amortization,
            interest_paid: match row.grace_type {
                GraceType::Total => Decimal::ZERO,
                GraceType::Parcial | GraceType::SinPlazo => row.interest,
            },
            effective_rate_period: row.effective_period_rate,
            grace_type: row.grace_type,
            remaining_balance: row.final_balance,
        })
        .collect()
}
