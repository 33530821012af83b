use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Largest schedule the engine will build (50 years of daily periods).
pub const DEFAULT_MAX_PERIODS: u32 = 18_000;

/// Days-in-year convention applied when the caller does not supply one.
pub const DEFAULT_DAYS_IN_YEAR: u32 = 360;

/// Limits and solver tolerances for one engine invocation.
///
/// Always passed explicitly; the engine never reads ambient configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Upper bound on the number of schedule periods.
    pub max_periods: u32,
    /// Newton-Raphson iteration budget for the IRR solver.
    pub irr_max_iterations: u32,
    /// |NPV| below which an IRR candidate is accepted.
    pub irr_tolerance: Decimal,
    /// Iteration budget for the bisection fallback.
    pub bisection_max_iterations: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_periods: DEFAULT_MAX_PERIODS,
            irr_max_iterations: 100,
            irr_tolerance: dec!(0.0000001),
            bisection_max_iterations: 200,
        }
    }
}
