use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MortgageSimError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.08 = 8%). Never as percentages.
pub type Rate = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Currency label carried through a calculation. Amounts are never converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    PEN,
    USD,
    Other(String),
}

/// Payment (or capitalisation) frequency, identified by the day length of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentFrequency {
    Diaria,
    Quincenal,
    Mensual,
    Bimestral,
    Trimestral,
    Cuatrimestral,
    Semestral,
    Anual,
}

impl PaymentFrequency {
    pub const ALL: [PaymentFrequency; 8] = [
        PaymentFrequency::Diaria,
        PaymentFrequency::Quincenal,
        PaymentFrequency::Mensual,
        PaymentFrequency::Bimestral,
        PaymentFrequency::Trimestral,
        PaymentFrequency::Cuatrimestral,
        PaymentFrequency::Semestral,
        PaymentFrequency::Anual,
    ];

    /// Days in one period of this frequency.
    pub fn days(self) -> u32 {
        match self {
            PaymentFrequency::Diaria => 1,
            PaymentFrequency::Quincenal => 15,
            PaymentFrequency::Mensual => 30,
            PaymentFrequency::Bimestral => 60,
            PaymentFrequency::Trimestral => 90,
            PaymentFrequency::Cuatrimestral => 120,
            PaymentFrequency::Semestral => 180,
            PaymentFrequency::Anual => 360,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            PaymentFrequency::Diaria => "DIARIA",
            PaymentFrequency::Quincenal => "QUINCENAL",
            PaymentFrequency::Mensual => "MENSUAL",
            PaymentFrequency::Bimestral => "BIMESTRAL",
            PaymentFrequency::Trimestral => "TRIMESTRAL",
            PaymentFrequency::Cuatrimestral => "CUATRIMESTRAL",
            PaymentFrequency::Semestral => "SEMESTRAL",
            PaymentFrequency::Anual => "ANUAL",
        }
    }

    /// Number of periods in a year of `days_in_year` days.
    pub fn periods_per_year(self, days_in_year: u32) -> Decimal {
        Decimal::from(days_in_year) / Decimal::from(self.days())
    }
}

impl FromStr for PaymentFrequency {
    type Err = MortgageSimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        PaymentFrequency::ALL
            .into_iter()
            .find(|f| f.code() == code)
            .ok_or_else(|| MortgageSimError::UnsupportedFrequency(s.to_string()))
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Grace classification of a single period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraceType {
    /// Nothing is paid; interest capitalises onto the balance.
    Total,
    /// Only interest is paid; the balance is unchanged.
    Parcial,
    /// Regular amortising period.
    SinPlazo,
}

impl fmt::Display for GraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GraceType::Total => "TOTAL",
            GraceType::Parcial => "PARCIAL",
            GraceType::SinPlazo => "SIN_PLAZO",
        };
        f.write_str(s)
    }
}

/// Round a monetary amount to the cent, half away from zero.
pub fn round2(value: Money) -> Money {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
