use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageSimError {
    #[error("Unsupported payment frequency: {0}")]
    UnsupportedFrequency(String),

    #[error("Missing rate input: {0}")]
    MissingRateInput(String),

    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    #[error("Schedule too large: {periods} periods exceeds the limit of {limit}")]
    ScheduleTooLarge { periods: Decimal, limit: u32 },

    #[error("IRR not found: {reason} after {iterations} iterations (last NPV: {last_npv})")]
    IrrNotFound {
        reason: String,
        iterations: u32,
        last_npv: Decimal,
    },

    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for MortgageSimError {
    fn from(e: serde_json::Error) -> Self {
        MortgageSimError::SerializationError(e.to_string())
    }
}
