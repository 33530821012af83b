pub mod amortization;
pub mod cash_flows;
pub mod loan;
pub mod overlay;
pub mod periods;
pub mod simulator;

#[cfg(feature = "parallel")]
pub mod batch;

pub use loan::{
    CashFlowPerspective, GraceConfig, InitialCosts, InsuranceBasis, LoanInput,
    PeriodCountRounding, PeriodicCosts, RateSource,
};
pub use overlay::ScheduleRow;
pub use simulator::{calculate_schedule, calculate_schedule_with, ScheduleResult};
