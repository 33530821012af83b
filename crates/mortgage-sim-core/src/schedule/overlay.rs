use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

use super::amortization::AmortizationRow;
use super::cash_flows::period_cash_flow;
use super::loan::{CashFlowPerspective, InsuranceBasis, PeriodicCosts};

/// Ancillary charges for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodCosts {
    pub life_insurance: Money,
    pub risk_insurance: Money,
    pub commission: Money,
    pub charges: Money,
    pub admin_expense: Money,
}

impl PeriodCosts {
    pub fn total(&self) -> Money {
        self.life_insurance + self.risk_insurance + self.commission + self.charges + self.admin_expense
    }
}

/// A fully priced schedule row: amortization plus costs and the period's cash flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub grace_type: GraceType,
    /// Effective annual rate in force (TEA)
    pub annual_rate: Rate,
    pub effective_period_rate: Rate,
    pub initial_balance: Money,
    pub interest: Money,
    pub installment: Money,
    pub amortization: Money,
    pub final_balance: Money,
    pub life_insurance: Money,
    pub risk_insurance: Money,
    pub commission: Money,
    pub charges: Money,
    pub admin_expense: Money,
    /// Installment plus every periodic cost
    pub total_payment: Money,
    /// Signed cash flow for this period under the chosen perspective
    pub cash_flow: Money,
}

/// Periodic costs for a row. Insurance premiums are the annual rate
/// prorated over `periods_per_year` on the chosen balance.
pub fn period_costs(
    row: &AmortizationRow,
    costs: &PeriodicCosts,
    basis: InsuranceBasis,
    periods_per_year: Decimal,
) -> PeriodCosts {
    let insured = match basis {
        InsuranceBasis::InitialBalance => row.initial_balance,
        InsuranceBasis::FinalBalance => row.final_balance,
    };

    PeriodCosts {
        life_insurance: round2(costs.life_insurance_annual_rate * insured / periods_per_year),
        risk_insurance: round2(costs.risk_insurance_annual_rate * insured / periods_per_year),
        commission: costs.commission,
        charges: costs.charges,
        admin_expense: costs.admin_expense,
    }
}

/// Options shared by every row of one overlay pass.
#[derive(Debug, Clone, Copy)]
pub struct OverlayContext<'a> {
    pub costs: &'a PeriodicCosts,
    pub basis: InsuranceBasis,
    pub periods_per_year: Decimal,
    pub perspective: CashFlowPerspective,
    pub frequency_days: u32,
    pub disbursement_date: Option<NaiveDate>,
}

/// Price one amortization row.
pub fn overlay_row(row: AmortizationRow, ctx: &OverlayContext<'_>) -> ScheduleRow {
    let costs = period_costs(&row, ctx.costs, ctx.basis, ctx.periods_per_year);
    let total_payment = round2(row.installment + costs.total());
    let payment_date = ctx.disbursement_date.and_then(|start| {
        start.checked_add_days(Days::new(u64::from(row.period) * u64::from(ctx.frequency_days)))
    });

    ScheduleRow {
        period: row.period,
        payment_date,
        grace_type: row.grace_type,
        annual_rate: row.annual_rate,
        effective_period_rate: row.effective_period_rate,
        initial_balance: row.initial_balance,
        interest: row.interest,
        installment: row.installment,
        amortization: row.amortization,
        final_balance: row.final_balance,
        life_insurance: costs.life_insurance,
        risk_insurance: costs.risk_insurance,
        commission: costs.commission,
        charges: costs.charges,
        admin_expense: costs.admin_expense,
        total_payment,
        cash_flow: period_cash_flow(total_payment, ctx.perspective),
    }
}

/// Price every row of a schedule.
pub fn overlay(rows: Vec<AmortizationRow>, ctx: &OverlayContext<'_>) -> Vec<ScheduleRow> {
    rows.into_iter().map(|row| overlay_row(row, ctx)).collect()
}
