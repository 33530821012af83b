pub mod error;
pub mod rates;
pub mod settings;
pub mod time_value;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "report")]
pub mod report;

pub use error::MortgageSimError;
pub use settings::EngineSettings;
pub use types::*;

/// Standard result type for all mortgage-sim operations
pub type MortgageSimResult<T> = Result<T, MortgageSimError>;
