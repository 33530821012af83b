use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::types::{PaymentFrequency, Rate};
use crate::MortgageSimResult;

/// How the caller-supplied annual rate is quoted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateKind {
    /// Effective annual rate (TEA); used as-is.
    #[default]
    Effective,
    /// Nominal annual rate (TNA) capitalised at the given frequency code.
    Nominal { capitalization: String },
}

impl RateKind {
    /// Normalise an annual rate of this kind to an effective annual rate.
    pub fn to_effective_annual(&self, annual_rate: Rate, days_in_year: u32) -> MortgageSimResult<Rate> {
        match self {
            RateKind::Effective => Ok(annual_rate),
            RateKind::Nominal { capitalization } => {
                let frequency: PaymentFrequency = capitalization.parse()?;
                let m = frequency.periods_per_year(days_in_year);
                nominal_to_effective_annual(annual_rate, m)
            }
        }
    }
}

/// Convert a nominal annual rate capitalised `m` times a year into an
/// effective annual rate: `(1 + j/m)^m - 1`.
pub fn nominal_to_effective_annual(
    nominal_rate: Rate,
    capitalization_periods_per_year: Decimal,
) -> MortgageSimResult<Rate> {
    if capitalization_periods_per_year <= Decimal::ZERO {
        return Err(MortgageSimError::InvalidInput {
            field: "capitalization_periods_per_year".into(),
            reason: "Capitalisation frequency must be positive".into(),
        });
    }
    let per_period = nominal_rate / capitalization_periods_per_year;
    if per_period <= Decimal::NEGATIVE_ONE {
        return Err(MortgageSimError::InvalidInput {
            field: "nominal_rate".into(),
            reason: "Nominal rate per capitalisation period must be greater than -100%".into(),
        });
    }
    let growth = checked_pow(
        Decimal::ONE + per_period,
        capitalization_periods_per_year,
        "nominal_rate",
    )?;
    Ok(growth - Decimal::ONE)
}

/// Convert an effective annual rate into the effective rate of a period of
/// `period_days` days: `(1 + TEA)^(period_days / days_in_year) - 1`.
pub fn effective_annual_to_period_rate(
    effective_annual_rate: Rate,
    period_days: u32,
    days_in_year: u32,
) -> MortgageSimResult<Rate> {
    if days_in_year == 0 {
        return Err(MortgageSimError::DivisionByZero {
            context: "days_in_year in period rate conversion".into(),
        });
    }
    if effective_annual_rate <= Decimal::NEGATIVE_ONE {
        return Err(MortgageSimError::InvalidInput {
            field: "effective_annual_rate".into(),
            reason: "Effective annual rate must be greater than -100%".into(),
        });
    }
    if effective_annual_rate.is_zero() || period_days == 0 {
        return Ok(Decimal::ZERO);
    }
    if period_days == days_in_year {
        return Ok(effective_annual_rate);
    }

    let exponent = Decimal::from(period_days) / Decimal::from(days_in_year);
    let growth = checked_pow(
        Decimal::ONE + effective_annual_rate,
        exponent,
        "effective_annual_rate",
    )?;
    Ok(growth - Decimal::ONE)
}

/// Effective per-period rate for a payment frequency.
pub fn frequency_period_rate(
    effective_annual_rate: Rate,
    frequency: PaymentFrequency,
    days_in_year: u32,
) -> MortgageSimResult<Rate> {
    effective_annual_to_period_rate(effective_annual_rate, frequency.days(), days_in_year)
}

/// `base^exponent` without panicking on overflow. Integral exponents take the
/// exact repeated-multiplication path.
pub(crate) fn checked_pow(base: Decimal, exponent: Decimal, field: &str) -> MortgageSimResult<Decimal> {
    let result = if exponent.fract().is_zero() {
        exponent
            .to_i64()
            .and_then(|n| base.checked_powi(n))
    } else {
        base.checked_powd(exponent)
    };
    result.ok_or_else(|| MortgageSimError::InvalidInput {
        field: field.into(),
        reason: format!("{base}^{exponent} is outside the representable range"),
    })
}
