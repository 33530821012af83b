use rayon::prelude::*;
use tracing::debug;

use crate::settings::EngineSettings;
use crate::types::ComputationOutput;
use crate::MortgageSimResult;

use super::loan::LoanInput;
use super::simulator::{calculate_schedule_with, ScheduleResult};

/// Simulate independent loan scenarios in parallel.
///
/// Results keep the order of `inputs`; a failing scenario does not affect the others.
pub fn simulate_batch(
    inputs: &[LoanInput],
    settings: &EngineSettings,
) -> Vec<MortgageSimResult<ComputationOutput<ScheduleResult>>> {
    debug!(scenarios = inputs.len(), "running batch simulation");
    inputs
        .par_iter()
        .map(|input| calculate_schedule_with(input, settings))
        .collect()
}
