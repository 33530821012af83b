use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use mortgage_sim_core::schedule::batch::simulate_batch;
use mortgage_sim_core::schedule::LoanInput;
use mortgage_sim_core::EngineSettings;

use crate::input;

/// Arguments for a multi-scenario run
#[derive(Args)]
pub struct BatchArgs {
    /// Path to a JSON or YAML file with a list of loans
    #[arg(long)]
    pub input: Option<String>,
}

/// Either a bare list of loans or `{ scenarios, settings }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchInput {
    Scenarios {
        scenarios: Vec<LoanInput>,
        #[serde(default)]
        settings: EngineSettings,
    },
    List(Vec<LoanInput>),
}

pub fn run_batch(args: BatchArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let batch: BatchInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file> or stdin required for batch runs".into());
    };

    let (scenarios, settings) = match batch {
        BatchInput::Scenarios {
            scenarios,
            settings,
        } => (scenarios, settings),
        BatchInput::List(scenarios) => (scenarios, EngineSettings::default()),
    };

    let outputs = simulate_batch(&scenarios, &settings);
    let failed = outputs.iter().filter(|o| o.is_err()).count();
    info!(scenarios = scenarios.len(), failed, "batch finished");

    let results: Vec<Value> = outputs
        .into_iter()
        .enumerate()
        .map(|(i, outcome)| match outcome {
            Ok(out) => {
                let r = out.result;
                json!({
                    "scenario": i + 1,
                    "frequency": r.frequency,
                    "total_periods": r.total_periods,
                    "financed_capital": r.financed_capital,
                    "first_installment": r.rows.iter().map(|row| row.installment).find(|amount| !amount.is_zero()),
                    "total_payments": r.total_payments,
                    "npv": r.npv,
                    "irr": r.irr,
                    "tcea": r.tcea,
                    "error": Value::Null,
                })
            }
            Err(e) => json!({
                "scenario": i + 1,
                "frequency": Value::Null,
                "total_periods": Value::Null,
                "financed_capital": Value::Null,
                "first_installment": Value::Null,
                "total_payments": Value::Null,
                "npv": Value::Null,
                "irr": Value::Null,
                "tcea": Value::Null,
                "error": e.to_string(),
            }),
        })
        .collect();

    Ok(json!({ "results": results }))
}
