use serde::{Deserialize, Serialize};

use crate::error::MortgageSimError;
use crate::time_value::annuity_payment;
use crate::types::*;
use crate::MortgageSimResult;

use super::periods::PeriodSlot;

/// Principal and interest for one period, before ancillary costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    pub grace_type: GraceType,
    pub annual_rate: Rate,
    pub effective_period_rate: Rate,
    pub initial_balance: Money,
    pub interest: Money,
    pub installment: Money,
    pub amortization: Money,
    pub final_balance: Money,
}

/// Roll `principal` forward through every slot. Each row's final balance is
/// the next row's initial balance.
pub fn amortize(principal: Money, slots: &[PeriodSlot]) -> MortgageSimResult<Vec<AmortizationRow>> {
    let mut remaining = slots
        .iter()
        .filter(|s| s.grace_type == GraceType::SinPlazo)
        .count() as u32;
    let mut balance = principal;
    let mut rows = Vec::with_capacity(slots.len());

    for slot in slots {
        let row = amortize_period(balance, slot, remaining)?;
        if slot.grace_type == GraceType::SinPlazo {
            remaining -= 1;
        }
        balance = row.final_balance;
        rows.push(row);
    }

    Ok(rows)
}

/// One transition of the grace state machine.
///
/// `remaining_amortizing` counts the SIN_PLAZO periods from this one to the
/// end of the schedule, so trailing grace does not stretch the annuity.
pub fn amortize_period(
    initial_balance: Money,
    slot: &PeriodSlot,
    remaining_amortizing: u32,
) -> MortgageSimResult<AmortizationRow> {
    let rate = slot.period_rate;
    let interest = round2(checked(rate.checked_mul(initial_balance), slot)?);

    let (installment, amortization, final_balance) = match slot.grace_type {
        GraceType::Total => {
            let capitalised = checked(initial_balance.checked_add(interest), slot)?;
            (Money::ZERO, Money::ZERO, round2(capitalised))
        }
        GraceType::Parcial => (interest, Money::ZERO, initial_balance),
        GraceType::SinPlazo if remaining_amortizing <= 1 => {
            // Last amortising period clears any rounding residue.
            let installment = round2(checked(interest.checked_add(initial_balance), slot)?);
            (installment, initial_balance, Money::ZERO)
        }
        GraceType::SinPlazo => {
            let installment = round2(annuity_payment(initial_balance, rate, remaining_amortizing)?);
            let amortization = round2(checked(installment.checked_sub(interest), slot)?);
            let final_balance = checked(initial_balance.checked_sub(amortization), slot)?;
            (installment, amortization, round2(final_balance))
        }
    };

    Ok(AmortizationRow {
        period: slot.period,
        grace_type: slot.grace_type,
        annual_rate: slot.annual_rate,
        effective_period_rate: rate,
        initial_balance,
        interest,
        installment,
        amortization,
        final_balance,
    })
}

fn checked(value: Option<Money>, slot: &PeriodSlot) -> MortgageSimResult<Money> {
    value.ok_or_else(|| MortgageSimError::InvalidInput {
        field: "balance".into(),
        reason: format!("Balance overflows at period {}", slot.period),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn slot(period: u32, grace_type: GraceType, period_rate: Rate) -> PeriodSlot {
        PeriodSlot {
            period,
            grace_type,
            quoted_rate: dec!(0.12),
            annual_rate: dec!(0.12),
            period_rate,
        }
    }

    #[test]
    fn test_total_grace_capitalises_interest() {
        let row = amortize_period(dec!(10000), &slot(1, GraceType::Total, dec!(0.01)), 5).unwrap();
        assert_eq!(row.interest, dec!(100));
        assert_eq!(row.installment, Decimal::ZERO);
        assert_eq!(row.amortization, Decimal::ZERO);
        assert_eq!(row.final_balance, dec!(10100));
    }

    #[test]
    fn test_partial_grace_pays_interest_only() {
        let row = amortize_period(dec!(10000), &slot(1, GraceType::Parcial, dec!(0.01)), 5).unwrap();
        assert_eq!(row.installment, dec!(100));
        assert_eq!(row.amortization, Decimal::ZERO);
        assert_eq!(row.final_balance, dec!(10000));
    }

    #[test]
    fn test_annuity_period() {
        // 10,000 over 12 periods at 1% => 888.49
        let row = amortize_period(dec!(10000), &slot(1, GraceType::SinPlazo, dec!(0.01)), 12).unwrap();
        assert_eq!(row.interest, dec!(100));
        assert_eq!(row.installment, dec!(888.49));
        assert_eq!(row.amortization, dec!(788.49));
        assert_eq!(row.final_balance, dec!(9211.51));
    }

    #[test]
    fn test_last_period_closes_balance() {
        let row = amortize_period(dec!(879.70), &slot(12, GraceType::SinPlazo, dec!(0.01)), 1).unwrap();
        assert_eq!(row.interest, dec!(8.80));
        assert_eq!(row.installment, dec!(888.50));
        assert_eq!(row.amortization, dec!(879.70));
        assert_eq!(row.final_balance, Decimal::ZERO);
    }

    #[test]
    fn test_amortize_chains_balances() {
        let slots: Vec<PeriodSlot> = (1..=12)
            .map(|p| slot(p, GraceType::SinPlazo, dec!(0.01)))
            .collect();
        let rows = amortize(dec!(10000), &slots).unwrap();
        for pair in rows.windows(2) {
            assert_eq!(pair[0].final_balance, pair[1].initial_balance);
        }
        assert_eq!(rows.last().unwrap().final_balance, Decimal::ZERO);
        let principal: Decimal = rows.iter().map(|r| r.amortization).sum();
        assert_eq!(principal, dec!(10000));
    }

    #[test]
    fn test_trailing_grace_does_not_stretch_annuity() {
        // 2 amortising periods followed by a partial-grace period
        let slots = vec![
            slot(1, GraceType::SinPlazo, Decimal::ZERO),
            slot(2, GraceType::SinPlazo, Decimal::ZERO),
            slot(3, GraceType::Parcial, Decimal::ZERO),
        ];
        let rows = amortize(dec!(1000), &slots).unwrap();
        assert_eq!(rows[0].installment, dec!(500));
        assert_eq!(rows[1].final_balance, Decimal::ZERO);
        assert_eq!(rows[2].installment, Decimal::ZERO);
    }

    #[test]
    fn test_capitalised_balance_overflow_is_an_error() {
        let huge = Decimal::MAX / dec!(2);
        let err = amortize_period(huge, &slot(1, GraceType::Total, dec!(1.5)), 5).unwrap_err();
        assert!(matches!(err, MortgageSimError::InvalidInput { .. }));
    }

    #[test]
    fn test_zero_rate_divides_evenly() {
        let slots: Vec<PeriodSlot> = (1..=4)
            .map(|p| slot(p, GraceType::SinPlazo, Decimal::ZERO))
            .collect();
        let rows = amortize(dec!(1000), &slots).unwrap();
        for row in &rows {
            assert_eq!(row.interest, Decimal::ZERO);
            assert_eq!(row.installment, dec!(250));
        }
    }
}
