use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::error::MortgageSimError;
use crate::rates::checked_pow;
use crate::settings::EngineSettings;
use crate::types::{Money, Rate};
use crate::MortgageSimResult;

/// Bisection stops once the bracket is narrower than this.
const BISECTION_WIDTH: Decimal = dec!(0.00000000000000000001);
const MAX_BRACKET_STEPS: u32 = 64;

/// Net Present Value of a series of per-period cash flows, `CF[0]` undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> MortgageSimResult<Money> {
    if rate <= Decimal::NEGATIVE_ONE {
        return Err(MortgageSimError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| MortgageSimError::InvalidInput {
                    field: "rate".into(),
                    reason: format!("Discount factor overflows at period {t}"),
                })?;
        }
        if discount.is_zero() {
            return Err(MortgageSimError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result = cf
            .checked_div(discount)
            .and_then(|term| result.checked_add(term))
            .ok_or_else(|| MortgageSimError::InvalidInput {
                field: "rate".into(),
                reason: format!("Discounted cash flow overflows at period {t}"),
            })?;
    }

    Ok(result)
}

/// Per-period Internal Rate of Return.
///
/// Newton-Raphson from `guess`; falls back to bracketing plus bisection when
/// the derivative vanishes, an iterate leaves (-1, inf) or the budget runs out.
pub fn irr(cash_flows: &[Money], guess: Rate, settings: &EngineSettings) -> MortgageSimResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(MortgageSimError::IrrNotFound {
            reason: "IRR requires at least 2 cash flows".into(),
            iterations: 0,
            last_npv: Decimal::ZERO,
        });
    }
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !(has_inflow && has_outflow) {
        return Err(MortgageSimError::IrrNotFound {
            reason: "cash flows never change sign".into(),
            iterations: 0,
            last_npv: cash_flows.iter().sum(),
        });
    }

    let seed = if guess > Decimal::NEGATIVE_ONE {
        guess
    } else {
        Decimal::ZERO
    };
    let mut rate = seed;

    for i in 0..settings.irr_max_iterations {
        let Some((npv_val, dnpv)) = npv_with_derivative(rate, cash_flows) else {
            debug!(iteration = i, %rate, "IRR: NPV not representable, switching to bisection");
            break;
        };

        if npv_val.abs() < settings.irr_tolerance {
            debug!(iterations = i, %rate, "IRR: Newton-Raphson converged");
            return Ok(rate);
        }

        if dnpv.is_zero() {
            debug!(iteration = i, "IRR: zero derivative, switching to bisection");
            break;
        }

        let Some(step) = npv_val.checked_div(dnpv) else {
            break;
        };
        let next = rate - step;
        if next <= Decimal::NEGATIVE_ONE {
            debug!(iteration = i, %next, "IRR: Newton step left the domain, switching to bisection");
            break;
        }
        rate = next;
    }

    bisect(cash_flows, seed, settings)
}

/// Total effective annual cost: the per-period IRR compounded over a year.
pub fn tcea(irr_per_period: Rate, periods_per_year: Decimal) -> MortgageSimResult<Rate> {
    if irr_per_period <= Decimal::NEGATIVE_ONE {
        return Err(MortgageSimError::InvalidInput {
            field: "irr_per_period".into(),
            reason: "Periodic rate must be greater than -100%".into(),
        });
    }
    let growth = checked_pow(Decimal::ONE + irr_per_period, periods_per_year, "irr_per_period")?;
    Ok(growth - Decimal::ONE)
}

/// Level installment that amortises `balance` over `periods` at `rate` per period.
pub fn annuity_payment(balance: Money, rate: Rate, periods: u32) -> MortgageSimResult<Money> {
    if periods == 0 {
        return Err(MortgageSimError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(balance / Decimal::from(periods));
    }

    let factor = checked_pow(Decimal::ONE + rate, Decimal::from(periods), "rate")?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(MortgageSimError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }

    rate
        .checked_mul(factor)
        .and_then(|numerator| numerator.checked_div(denominator))
        .and_then(|coefficient| balance.checked_mul(coefficient))
        .ok_or_else(|| MortgageSimError::InvalidInput {
            field: "balance".into(),
            reason: format!("Installment overflows over {periods} periods"),
        })
}

/// NPV and dNPV/dr using running discount factors. `None` when a term is not
/// representable at this rate.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let v = Decimal::ONE.checked_div(Decimal::ONE + rate)?;
    let mut factor = Decimal::ONE;
    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            factor = factor.checked_mul(v)?;
        }
        let term = cf.checked_mul(factor)?;
        value = value.checked_add(term)?;
        if t > 0 {
            let d = Decimal::from(t as u64).checked_mul(term)?.checked_mul(v)?;
            slope = slope.checked_sub(d)?;
        }
    }

    Some((value, slope))
}

fn npv_value(rate: Rate, cash_flows: &[Money]) -> Option<Decimal> {
    npv_with_derivative(rate, cash_flows).map(|(value, _)| value)
}

fn bisect(cash_flows: &[Money], seed: Rate, settings: &EngineSettings) -> MortgageSimResult<Rate> {
    let (mut lo, mut hi) = bracket(cash_flows, seed)?;
    let mut f_lo = npv_value(lo, cash_flows).unwrap_or_default();
    let mut last_npv = f_lo;

    for i in 0..settings.bisection_max_iterations {
        let mid = (lo + hi) / dec!(2);
        let f_mid = npv_value(mid, cash_flows).ok_or_else(|| MortgageSimError::IrrNotFound {
            reason: format!("NPV not representable at rate {mid}"),
            iterations: i,
            last_npv,
        })?;
        last_npv = f_mid;

        if f_mid.abs() < settings.irr_tolerance || hi - lo < BISECTION_WIDTH {
            debug!(iterations = i, rate = %mid, "IRR: bisection converged");
            return Ok(mid);
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(MortgageSimError::IrrNotFound {
        reason: "bisection did not converge".into(),
        iterations: settings.bisection_max_iterations,
        last_npv,
    })
}

/// Find `lo < hi` with NPV of opposite signs, widening outward from the seed.
fn bracket(cash_flows: &[Money], seed: Rate) -> MortgageSimResult<(Rate, Rate)> {
    let not_found = |last_npv: Decimal| MortgageSimError::IrrNotFound {
        reason: "no sign change found while bracketing the root".into(),
        iterations: MAX_BRACKET_STEPS,
        last_npv,
    };

    let mut lo = (seed.min(Decimal::ZERO) - dec!(0.01)).max(dec!(-0.5));
    let mut hi = seed.max(Decimal::ZERO) + dec!(0.1);
    let mut f_lo = npv_value(lo, cash_flows).ok_or_else(|| not_found(Decimal::ZERO))?;
    let mut f_hi = npv_value(hi, cash_flows).ok_or_else(|| not_found(f_lo))?;

    for _ in 0..MAX_BRACKET_STEPS {
        if f_lo.is_zero() {
            return Ok((lo, lo));
        }
        if f_hi.is_zero() {
            return Ok((hi, hi));
        }
        if f_lo.is_sign_negative() != f_hi.is_sign_negative() {
            return Ok((lo, hi));
        }

        let wider_hi = hi * dec!(2);
        if let Some(f) = npv_value(wider_hi, cash_flows) {
            hi = wider_hi;
            f_hi = f;
        }
        let wider_lo = (lo - Decimal::ONE) / dec!(2);
        if let Some(f) = npv_value(wider_lo, cash_flows) {
            lo = wider_lo;
            f_lo = f;
        }
    }

    Err(not_found(f_hi))
}
