use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MortgageSimError;
use crate::rates::effective_annual_to_period_rate;
use crate::settings::EngineSettings;
use crate::types::*;
use crate::MortgageSimResult;

use super::loan::{GraceConfig, LoanInput, PeriodCountRounding, RateSource};

/// Rate and grace classification resolved for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodSlot {
    pub period: u32,
    pub grace_type: GraceType,
    /// Annual rate as quoted by the caller
    pub quoted_rate: Rate,
    /// Effective annual rate (TEA) after nominal conversion
    pub annual_rate: Rate,
    /// Effective rate for this period (TEP)
    pub period_rate: Rate,
}

/// Ordered period sequence for a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodPlan {
    pub frequency: PaymentFrequency,
    pub days_in_year: u32,
    pub periods_per_year: Decimal,
    pub total_periods: u32,
    pub slots: Vec<PeriodSlot>,
}

/// Whole number of periods in the term, bounded by `max_periods`.
pub fn period_count(
    periods_per_year: Decimal,
    years: Years,
    rounding: PeriodCountRounding,
    max_periods: u32,
) -> MortgageSimResult<u32> {
    // Drop division residue (7/12 × 6 is 3.4999...) before rounding.
    let raw = (periods_per_year * years).round_dp(12);
    if raw <= Decimal::ZERO {
        return Err(MortgageSimError::InvalidTerm(format!(
            "term of {years} years yields {raw} periods"
        )));
    }

    let whole = match rounding {
        PeriodCountRounding::Floor => raw.floor(),
        PeriodCountRounding::Round => {
            raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        }
    };
    if whole > Decimal::from(max_periods) {
        return Err(MortgageSimError::ScheduleTooLarge {
            periods: whole,
            limit: max_periods,
        });
    }

    match whole.to_u32() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(MortgageSimError::InvalidTerm(format!(
            "term of {years} years is shorter than one payment period"
        ))),
    }
}

/// Zero-based position of a 1-based period number.
fn period_index(period: u32) -> MortgageSimResult<u32> {
    period
        .checked_sub(1)
        .ok_or_else(|| MortgageSimError::InvalidInput {
            field: "period".into(),
            reason: "Periods are numbered from 1".into(),
        })
}

/// Grace classification of `period`: the override array wins, then the
/// leading grace block.
pub fn resolve_grace_type(
    period: u32,
    overrides: Option<&[GraceType]>,
    config: &GraceConfig,
) -> MortgageSimResult<GraceType> {
    let index = period_index(period)?;
    if let Some(overrides) = overrides {
        return Ok(overrides
            .get(index as usize)
            .copied()
            .unwrap_or(GraceType::SinPlazo));
    }
    let grace_type = if period <= config.total_periods {
        GraceType::Total
    } else if period <= config.total_periods.saturating_add(config.partial_periods) {
        GraceType::Parcial
    } else {
        GraceType::SinPlazo
    };
    Ok(grace_type)
}

/// Annual rate quoted for `period` (1-based).
pub fn resolve_annual_rate(
    period: u32,
    source: &RateSource,
    periods_per_year: Decimal,
) -> MortgageSimResult<Rate> {
    let index = period_index(period)?;
    let (rates, index) = match source {
        RateSource::Flat(rate) => return Ok(*rate),
        RateSource::PerPeriod(rates) => (rates, index as usize),
        RateSource::PerYear(rates) => {
            let year_index = (Decimal::from(index) / periods_per_year)
                .floor()
                .to_usize()
                .unwrap_or(usize::MAX);
            (rates, year_index)
        }
    };

    rates
        .get(index)
        .or_else(|| rates.last())
        .copied()
        .ok_or_else(|| MortgageSimError::MissingRateInput("rate array is empty".into()))
}

/// Resolve frequency, period count, rates and grace types for every period.
pub fn build_period_plan(
    input: &LoanInput,
    settings: &EngineSettings,
    warnings: &mut Vec<String>,
) -> MortgageSimResult<PeriodPlan> {
    let frequency: PaymentFrequency = input.frequency.parse()?;

    if input.days_in_year == 0 {
        return Err(MortgageSimError::InvalidInput {
            field: "days_in_year".into(),
            reason: "Days in year must be positive".into(),
        });
    }
    if input.rates.is_empty() {
        return Err(MortgageSimError::MissingRateInput(
            "at least one annual rate is required".into(),
        ));
    }

    let periods_per_year = frequency.periods_per_year(input.days_in_year);
    let total_periods = period_count(
        periods_per_year,
        input.term_years(),
        input.period_count_rounding,
        settings.max_periods,
    )?;

    let overrides = input.grace_overrides.as_deref();
    if let Some(o) = overrides {
        if o.len() > total_periods as usize {
            let msg = format!(
                "{} grace overrides supplied for {} periods; extra entries ignored",
                o.len(),
                total_periods
            );
            warn!("{msg}");
            warnings.push(msg);
        }
    } else if input
        .grace
        .total_periods
        .saturating_add(input.grace.partial_periods)
        >= total_periods
    {
        let msg = format!(
            "Grace configuration ({} total, {} partial) covers all {} periods",
            input.grace.total_periods, input.grace.partial_periods, total_periods
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    // Consecutive periods usually share a rate; convert each distinct rate once.
    let mut cached: Option<(Rate, Rate, Rate)> = None;
    let mut slots = Vec::with_capacity(total_periods as usize);

    for period in 1..=total_periods {
        let quoted_rate = resolve_annual_rate(period, &input.rates, periods_per_year)?;
        let (annual_rate, period_rate) = match cached {
            Some((q, a, p)) if q == quoted_rate => (a, p),
            _ => {
                let a = input
                    .rate_kind
                    .to_effective_annual(quoted_rate, input.days_in_year)?;
                let p = effective_annual_to_period_rate(a, frequency.days(), input.days_in_year)?;
                cached = Some((quoted_rate, a, p));
                (a, p)
            }
        };

        slots.push(PeriodSlot {
            period,
            grace_type: resolve_grace_type(period, overrides, &input.grace)?,
            quoted_rate,
            annual_rate,
            period_rate,
        });
    }

    debug!(
        frequency = %frequency,
        %periods_per_year,
        total_periods,
        "period plan resolved"
    );

    Ok(PeriodPlan {
        frequency,
        days_in_year: input.days_in_year,
        periods_per_year,
        total_periods,
        slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn monthly_input() -> LoanInput {
        LoanInput::new(dec!(400000), dec!(50000), dec!(20), "MENSUAL", dec!(0.08))
    }

    #[test]
    fn test_period_count_floor_vs_round() {
        // 365/30 periods per year over 1 year = 12.1666...
        let ppy = Decimal::from(365) / Decimal::from(30);
        assert_eq!(period_count(ppy, dec!(1), PeriodCountRounding::Floor, 1000).unwrap(), 12);
        // 1.9 years semiannual = 3.8 periods
        assert_eq!(period_count(dec!(2), dec!(1.9), PeriodCountRounding::Floor, 1000).unwrap(), 3);
        assert_eq!(period_count(dec!(2), dec!(1.9), PeriodCountRounding::Round, 1000).unwrap(), 4);
    }

    #[test]
    fn test_period_count_invalid_term() {
        assert!(matches!(
            period_count(dec!(12), Decimal::ZERO, PeriodCountRounding::Floor, 1000),
            Err(MortgageSimError::InvalidTerm(_))
        ));
        // Half a year with annual payments floors to zero periods
        assert!(matches!(
            period_count(dec!(1), dec!(0.5), PeriodCountRounding::Floor, 1000),
            Err(MortgageSimError::InvalidTerm(_))
        ));
    }

    #[test]
    fn test_period_count_too_large() {
        assert!(matches!(
            period_count(dec!(360), dec!(60), PeriodCountRounding::Floor, 18_000),
            Err(MortgageSimError::ScheduleTooLarge { limit: 18_000, .. })
        ));
    }

    #[test]
    fn test_grace_from_config() {
        let cfg = GraceConfig {
            total_periods: 2,
            partial_periods: 3,
        };
        assert_eq!(resolve_grace_type(1, None, &cfg).unwrap(), GraceType::Total);
        assert_eq!(resolve_grace_type(2, None, &cfg).unwrap(), GraceType::Total);
        assert_eq!(resolve_grace_type(3, None, &cfg).unwrap(), GraceType::Parcial);
        assert_eq!(resolve_grace_type(5, None, &cfg).unwrap(), GraceType::Parcial);
        assert_eq!(resolve_grace_type(6, None, &cfg).unwrap(), GraceType::SinPlazo);
    }

    #[test]
    fn test_grace_override_wins() {
        let cfg = GraceConfig {
            total_periods: 5,
            partial_periods: 0,
        };
        let overrides = [GraceType::Parcial, GraceType::SinPlazo, GraceType::Total];
        assert_eq!(resolve_grace_type(1, Some(&overrides), &cfg).unwrap(), GraceType::Parcial);
        assert_eq!(resolve_grace_type(2, Some(&overrides), &cfg).unwrap(), GraceType::SinPlazo);
        assert_eq!(resolve_grace_type(3, Some(&overrides), &cfg).unwrap(), GraceType::Total);
        assert_eq!(resolve_grace_type(4, Some(&overrides), &cfg).unwrap(), GraceType::SinPlazo);
    }

    #[test]
    fn test_rate_curve_holds_last_value() {
        let source = RateSource::PerPeriod(vec![dec!(0.07), dec!(0.08), dec!(0.09)]);
        assert_eq!(resolve_annual_rate(1, &source, dec!(12)).unwrap(), dec!(0.07));
        assert_eq!(resolve_annual_rate(3, &source, dec!(12)).unwrap(), dec!(0.09));
        assert_eq!(resolve_annual_rate(200, &source, dec!(12)).unwrap(), dec!(0.09));
    }

    #[test]
    fn test_rate_per_year() {
        let source = RateSource::PerYear(vec![dec!(0.07), dec!(0.08)]);
        assert_eq!(resolve_annual_rate(1, &source, dec!(12)).unwrap(), dec!(0.07));
        assert_eq!(resolve_annual_rate(12, &source, dec!(12)).unwrap(), dec!(0.07));
        assert_eq!(resolve_annual_rate(13, &source, dec!(12)).unwrap(), dec!(0.08));
        assert_eq!(resolve_annual_rate(100, &source, dec!(12)).unwrap(), dec!(0.08));
    }

    #[test]
    fn test_period_zero_is_rejected() {
        let cfg = GraceConfig::default();
        assert!(matches!(
            resolve_grace_type(0, None, &cfg),
            Err(MortgageSimError::InvalidInput { .. })
        ));
        assert!(resolve_grace_type(0, Some(&[GraceType::Total]), &cfg).is_err());

        for source in [
            RateSource::Flat(dec!(0.08)),
            RateSource::PerPeriod(vec![dec!(0.07)]),
            RateSource::PerYear(vec![dec!(0.07)]),
        ] {
            assert!(matches!(
                resolve_annual_rate(0, &source, dec!(12)),
                Err(MortgageSimError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_plan_monthly_flat() {
        let mut warnings = Vec::new();
        let plan = build_period_plan(&monthly_input(), &EngineSettings::default(), &mut warnings).unwrap();
        assert_eq!(plan.periods_per_year, dec!(12));
        assert_eq!(plan.total_periods, 240);
        assert_eq!(plan.slots.len(), 240);
        assert!(plan.slots.iter().all(|s| s.grace_type == GraceType::SinPlazo));
        assert!(plan.slots.iter().all(|s| s.period_rate == plan.slots[0].period_rate));
        assert_eq!(plan.slots.last().unwrap().period, 240);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_plan_rejects_unknown_frequency() {
        let mut input = monthly_input();
        input.frequency = "WEEKLY".into();
        let err = build_period_plan(&input, &EngineSettings::default(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, MortgageSimError::UnsupportedFrequency(_)));
    }

    #[test]
    fn test_plan_rejects_empty_rates() {
        let mut input = monthly_input();
        input.rates = RateSource::PerPeriod(vec![]);
        let err = build_period_plan(&input, &EngineSettings::default(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, MortgageSimError::MissingRateInput(_)));
    }

    #[test]
    fn test_plan_warns_on_surplus_overrides() {
        let mut input = monthly_input();
        input.years = dec!(0.25);
        input.grace_overrides = Some(vec![GraceType::Total; 5]);
        let mut warnings = Vec::new();
        let plan = build_period_plan(&input, &EngineSettings::default(), &mut warnings).unwrap();
        assert_eq!(plan.total_periods, 3);
        assert_eq!(warnings.len(), 1);
    }
}
