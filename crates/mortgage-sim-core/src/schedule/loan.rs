use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rates::RateKind;
use crate::settings::DEFAULT_DAYS_IN_YEAR;
use crate::types::*;

/// Source of the annual rate applied to each period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    /// One rate for the whole schedule.
    Flat(Rate),
    /// Rate for period k at index k-1; the last rate holds beyond the array.
    PerPeriod(Vec<Rate>),
    /// Rate for loan year y at index y-1; the last rate holds beyond the array.
    PerYear(Vec<Rate>),
}

impl RateSource {
    pub fn is_empty(&self) -> bool {
        match self {
            RateSource::Flat(_) => false,
            RateSource::PerPeriod(rates) | RateSource::PerYear(rates) => rates.is_empty(),
        }
    }

    /// First rate of the curve, used as the report's base TEA.
    pub fn base_rate(&self) -> Option<Rate> {
        match self {
            RateSource::Flat(rate) => Some(*rate),
            RateSource::PerPeriod(rates) | RateSource::PerYear(rates) => rates.first().copied(),
        }
    }
}

/// Leading grace block: periods `1..=total_periods` are TOTAL, the next
/// `partial_periods` are PARCIAL and the rest amortise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraceConfig {
    pub total_periods: u32,
    pub partial_periods: u32,
}

/// How `years × periods_per_year` becomes a whole period count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodCountRounding {
    #[default]
    Floor,
    Round,
}

/// One-time costs incurred at disbursement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialCosts {
    pub notary: Money,
    pub registry: Money,
    pub appraisal: Money,
    pub study_commission: Money,
    pub activation_commission: Money,
}

impl InitialCosts {
    pub fn total(&self) -> Money {
        self.notary
            + self.registry
            + self.appraisal
            + self.study_commission
            + self.activation_commission
    }
}

/// Costs charged with every installment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicCosts {
    /// Flat commission per period
    pub commission: Money,
    /// Flat charges (postage etc.) per period
    pub charges: Money,
    /// Flat administrative expense per period
    pub admin_expense: Money,
    /// Annual life (desgravamen) insurance rate on the outstanding balance
    pub life_insurance_annual_rate: Rate,
    /// Annual risk insurance rate on the outstanding balance
    pub risk_insurance_annual_rate: Rate,
}

/// Balance the insurance rates are applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsuranceBasis {
    #[default]
    InitialBalance,
    FinalBalance,
}

/// Whose cash flows feed NPV and IRR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowPerspective {
    /// Receives the loan at period 0, pays installments afterwards.
    #[default]
    Borrower,
    /// The sign-flipped borrower stream.
    Lender,
}

impl CashFlowPerspective {
    /// Sign applied to borrower-perspective amounts.
    pub fn sign(self) -> Decimal {
        match self {
            CashFlowPerspective::Borrower => Decimal::ONE,
            CashFlowPerspective::Lender => Decimal::NEGATIVE_ONE,
        }
    }
}

fn default_days_in_year() -> u32 {
    DEFAULT_DAYS_IN_YEAR
}

/// Fully resolved loan parameters for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    /// Property price
    pub price: Money,
    /// Down payment amount
    pub down_payment: Money,
    /// Housing bond / subsidy applied against the price
    #[serde(default)]
    pub bond_amount: Money,
    /// Loan term in years (ignored when `term_months` is given)
    pub years: Years,
    /// Loan term in months
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    /// Payment frequency code (MENSUAL, TRIMESTRAL, ...)
    pub frequency: String,
    #[serde(default = "default_days_in_year")]
    pub days_in_year: u32,
    #[serde(default)]
    pub period_count_rounding: PeriodCountRounding,
    pub rates: RateSource,
    #[serde(default)]
    pub rate_kind: RateKind,
    #[serde(default)]
    pub grace: GraceConfig,
    /// Explicit per-period grace classification; takes priority over `grace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_overrides: Option<Vec<GraceType>>,
    #[serde(default)]
    pub initial_costs: InitialCosts,
    #[serde(default)]
    pub periodic_costs: PeriodicCosts,
    #[serde(default)]
    pub insurance_basis: InsuranceBasis,
    /// Opportunity cost of capital (COK) as an effective annual rate
    #[serde(default)]
    pub opportunity_rate: Rate,
    /// Finance the initial costs instead of paying them at disbursement
    #[serde(default)]
    pub capitalize_initial_costs: bool,
    #[serde(default)]
    pub perspective: CashFlowPerspective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,
    #[serde(default)]
    pub currency: Currency,
}

impl LoanInput {
    /// Loan with a flat effective annual rate and every optional field at its default.
    pub fn new(
        price: Money,
        down_payment: Money,
        years: Years,
        frequency: impl Into<String>,
        annual_rate: Rate,
    ) -> Self {
        Self {
            price,
            down_payment,
            bond_amount: Decimal::ZERO,
            years,
            term_months: None,
            frequency: frequency.into(),
            days_in_year: DEFAULT_DAYS_IN_YEAR,
            period_count_rounding: PeriodCountRounding::default(),
            rates: RateSource::Flat(annual_rate),
            rate_kind: RateKind::default(),
            grace: GraceConfig::default(),
            grace_overrides: None,
            initial_costs: InitialCosts::default(),
            periodic_costs: PeriodicCosts::default(),
            insurance_basis: InsuranceBasis::default(),
            opportunity_rate: Decimal::ZERO,
            capitalize_initial_costs: false,
            perspective: CashFlowPerspective::default(),
            disbursement_date: None,
            currency: Currency::default(),
        }
    }

    /// `max(0, price - down payment - bond)`, to the cent.
    pub fn financed_capital(&self) -> Money {
        let capital = round2(self.price) - round2(self.down_payment) - round2(self.bond_amount);
        round2(capital.max(Decimal::ZERO))
    }

    /// Term in years, derived from `term_months` when present.
    pub fn term_years(&self) -> Years {
        match self.term_months {
            Some(months) => Decimal::from(months) / Decimal::from(12),
            None => self.years,
        }
    }
}
