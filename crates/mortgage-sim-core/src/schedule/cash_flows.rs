use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::settings::EngineSettings;
use crate::time_value;
use crate::types::*;
use crate::MortgageSimResult;

use super::loan::CashFlowPerspective;
use super::overlay::ScheduleRow;

/// Summary indicators derived from the cash-flow vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowMetrics {
    /// Opportunity rate converted to the payment period
    pub opportunity_period_rate: Rate,
    /// Net present value (VAN) at the opportunity period rate
    pub npv: Money,
    /// Internal rate of return per period (TIR)
    pub irr: Rate,
    /// Total effective annual cost (TCEA)
    pub tcea: Rate,
}

/// Period-0 flow. The borrower receives the financed capital and pays the
/// initial costs up front unless they were capitalised into the loan.
pub fn disbursement_cash_flow(
    financed_capital: Money,
    initial_costs: Money,
    capitalize_initial_costs: bool,
    perspective: CashFlowPerspective,
) -> Money {
    let upfront = if capitalize_initial_costs {
        Decimal::ZERO
    } else {
        initial_costs
    };
    perspective.sign() * (financed_capital - upfront)
}

/// Flow for a regular period: the borrower pays the total payment.
pub fn period_cash_flow(total_payment: Money, perspective: CashFlowPerspective) -> Money {
    -perspective.sign() * total_payment
}

/// `[CF0, CF1, ..., CFN]`.
pub fn cash_flow_vector(disbursement: Money, rows: &[ScheduleRow]) -> Vec<Money> {
    std::iter::once(disbursement)
        .chain(rows.iter().map(|r| r.cash_flow))
        .collect()
}

/// NPV at the opportunity rate, IRR seeded at that rate and the annualised TCEA.
pub fn compute_metrics(
    cash_flows: &[Money],
    opportunity_period_rate: Rate,
    periods_per_year: Decimal,
    settings: &EngineSettings,
) -> MortgageSimResult<CashFlowMetrics> {
    let npv = time_value::npv(opportunity_period_rate, cash_flows)?;
    let irr = time_value::irr(cash_flows, opportunity_period_rate, settings)?;
    let tcea = time_value::tcea(irr, periods_per_year)?;

    debug!(%npv, %irr, %tcea, "cash-flow metrics solved");

    Ok(CashFlowMetrics {
        opportunity_period_rate,
        npv,
        irr,
        tcea,
    })
}
