use chrono::NaiveDate;
use mortgage_sim_core::rates::RateKind;
use mortgage_sim_core::schedule::{
    calculate_schedule, calculate_schedule_with, GraceConfig, InsuranceBasis, LoanInput,
    PeriodCountRounding, PeriodicCosts, RateSource, ScheduleRow,
};
use mortgage_sim_core::time_value::annuity_payment;
use mortgage_sim_core::{round2, EngineSettings, GraceType, MortgageSimError};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn standard_loan() -> LoanInput {
    LoanInput::new(dec!(400000), dec!(50000), dec!(20), "MENSUAL", dec!(0.08))
}

// ===========================================================================
// Standard annuity: 350,000 over 240 monthly periods at 8% TEA
// ===========================================================================

#[test]
fn test_standard_loan_shape() {
    let r = calculate_schedule(&standard_loan()).unwrap().result;

    assert_eq!(r.financed_capital, dec!(350000.00));
    assert_eq!(r.periods_per_year, dec!(12));
    assert_eq!(r.total_periods, 240);
    assert_eq!(r.rows.len(), 240);
    assert_eq!(r.rows[0].initial_balance, dec!(350000.00));
    assert_eq!(r.rows[239].final_balance, Decimal::ZERO);

    let periods: Vec<u32> = r.rows.iter().map(|row| row.period).collect();
    assert_eq!(periods, (1..=240).collect::<Vec<u32>>());
}

#[test]
fn test_standard_loan_balance_strictly_decreases() {
    let r = calculate_schedule(&standard_loan()).unwrap().result;
    for pair in r.rows.windows(2) {
        assert_eq!(pair[0].final_balance, pair[1].initial_balance);
        assert!(pair[1].final_balance < pair[0].final_balance);
    }
}

#[test]
fn test_standard_loan_installment_is_constant() {
    let r = calculate_schedule(&standard_loan()).unwrap().result;
    let first = r.rows[0].installment;
    // 350,000 at (1.08)^(1/12)-1 over 240 periods
    assert!(first > dec!(2860) && first < dec!(2875), "installment {first}");
    for row in &r.rows {
        assert!(
            (row.installment - first).abs() <= dec!(0.01),
            "period {} installment {} drifts from {}",
            row.period,
            row.installment,
            first
        );
    }
}

#[test]
fn test_standard_loan_totals() {
    let r = calculate_schedule(&standard_loan()).unwrap().result;
    assert_eq!(r.total_amortization, dec!(350000.00));
    assert_eq!(r.total_interest, r.total_installments - r.total_amortization);
    assert_eq!(r.total_interest_paid, r.total_interest);
    // No periodic costs: payments are the installments
    assert_eq!(r.total_payments, r.total_installments);
}

// ===========================================================================
// Grace periods: 3 TOTAL then 3 PARCIAL
// ===========================================================================

fn grace_loan() -> LoanInput {
    let mut input = standard_loan();
    input.grace = GraceConfig {
        total_periods: 3,
        partial_periods: 3,
    };
    input
}

#[test]
fn test_total_grace_rows_capitalise() {
    let r = calculate_schedule(&grace_loan()).unwrap().result;
    for row in &r.rows[0..3] {
        assert_eq!(row.grace_type, GraceType::Total);
        assert_eq!(row.installment, Decimal::ZERO);
        assert_eq!(row.amortization, Decimal::ZERO);
        assert!(row.interest > Decimal::ZERO);
        assert_eq!(row.final_balance, row.initial_balance + row.interest);
        assert!(row.final_balance > row.initial_balance);
    }
}

#[test]
fn test_partial_grace_rows_pay_interest_only() {
    let r = calculate_schedule(&grace_loan()).unwrap().result;
    let carried = r.rows[2].final_balance;
    for row in &r.rows[3..6] {
        assert_eq!(row.grace_type, GraceType::Parcial);
        assert_eq!(row.installment, row.interest);
        assert_eq!(row.final_balance, row.initial_balance);
        assert_eq!(row.initial_balance, carried);
    }
}

#[test]
fn test_amortisation_after_grace_repays_carried_balance() {
    let r = calculate_schedule(&grace_loan()).unwrap().result;
    let carried = r.rows[5].final_balance;
    assert!(carried > dec!(350000));

    let first_amortising = &r.rows[6];
    assert_eq!(first_amortising.grace_type, GraceType::SinPlazo);
    let expected = round2(
        annuity_payment(carried, first_amortising.effective_period_rate, 234).unwrap(),
    );
    assert_eq!(first_amortising.installment, expected);

    let repaid: Decimal = r.rows[6..].iter().map(|row| row.amortization).sum();
    assert_eq!(repaid, carried);
    assert_eq!(r.rows[239].final_balance, Decimal::ZERO);

    // Capitalised interest is accrued but not paid in cash
    assert!(r.total_interest > r.total_interest_paid);
}

// ===========================================================================
// Rate sources
// ===========================================================================

#[test]
fn test_zero_rate_divides_balance_evenly() {
    let mut input = LoanInput::new(dec!(240000), dec!(0), dec!(20), "MENSUAL", Decimal::ZERO);
    input.rates = RateSource::PerPeriod(vec![Decimal::ZERO]);
    let r = calculate_schedule(&input).unwrap().result;

    for row in &r.rows {
        assert_eq!(row.interest, Decimal::ZERO);
        assert_eq!(row.effective_period_rate, Decimal::ZERO);
        assert_eq!(row.installment, dec!(1000));
    }
    assert_eq!(r.irr, Decimal::ZERO);
}

#[test]
fn test_zero_rate_installment_over_remaining_periods() {
    let mut input = LoanInput::new(dec!(1000), dec!(0), dec!(1), "TRIMESTRAL", Decimal::ZERO);
    input.grace = GraceConfig {
        total_periods: 0,
        partial_periods: 2,
    };
    let r = calculate_schedule(&input).unwrap().result;
    // Two PARCIAL periods, then 1000 / 2 on each remaining period
    assert_eq!(r.rows[2].installment, dec!(500));
    assert_eq!(r.rows[3].installment, dec!(500));
    assert_eq!(r.rows[3].final_balance, Decimal::ZERO);
}

#[test]
fn test_rate_per_year_switches_on_anniversary() {
    let mut input = standard_loan();
    input.years = dec!(2);
    input.rates = RateSource::PerYear(vec![dec!(0.08), dec!(0.10)]);
    let r = calculate_schedule(&input).unwrap().result;

    assert!(r.rows[..12].iter().all(|row| row.annual_rate == dec!(0.08)));
    assert!(r.rows[12..].iter().all(|row| row.annual_rate == dec!(0.10)));
    assert!(r.rows[12].installment > r.rows[11].installment);
    assert_eq!(r.rows[23].final_balance, Decimal::ZERO);
}

#[test]
fn test_nominal_rate_is_converted() {
    let mut input = standard_loan();
    input.years = dec!(1);
    input.rates = RateSource::Flat(dec!(0.12));
    input.rate_kind = RateKind::Nominal {
        capitalization: "MENSUAL".into(),
    };
    let r = calculate_schedule(&input).unwrap().result;
    let row = &r.rows[0];
    assert!((row.annual_rate - dec!(0.1268250301)).abs() < dec!(0.0000000001));
    assert!((row.effective_period_rate - dec!(0.01)).abs() < dec!(0.000001));
}

// ===========================================================================
// Known-answer schedule (annual payments make the period rate exact)
// ===========================================================================

#[test]
fn test_known_answer_annual_schedule() {
    let input = LoanInput::new(dec!(10000), dec!(0), dec!(3), "ANUAL", dec!(0.10));
    let r = calculate_schedule(&input).unwrap().result;

    assert_eq!(
        r.rows[0],
        ScheduleRow {
            period: 1,
            payment_date: None,
            grace_type: GraceType::SinPlazo,
            annual_rate: dec!(0.10),
            effective_period_rate: dec!(0.10),
            initial_balance: dec!(10000),
            interest: dec!(1000.00),
            installment: dec!(4021.15),
            amortization: dec!(3021.15),
            final_balance: dec!(6978.85),
            life_insurance: Decimal::ZERO,
            risk_insurance: Decimal::ZERO,
            commission: Decimal::ZERO,
            charges: Decimal::ZERO,
            admin_expense: Decimal::ZERO,
            total_payment: dec!(4021.15),
            cash_flow: dec!(-4021.15),
        }
    );
    assert_eq!(r.rows[1].interest, dec!(697.89));
    assert_eq!(r.rows[1].final_balance, dec!(3655.59));
    assert_eq!(r.rows[2].interest, dec!(365.56));
    assert_eq!(r.rows[2].installment, dec!(4021.15));
    assert_eq!(r.total_installments, dec!(12063.45));
    assert_eq!(r.total_interest, dec!(2063.45));
    assert_eq!(
        r.cash_flows,
        vec![dec!(10000), dec!(-4021.15), dec!(-4021.15), dec!(-4021.15)]
    );
    // One period per year: TCEA equals the per-period IRR
    assert!((r.tcea - r.irr).abs() < dec!(0.0000000001));
}

// ===========================================================================
// Term conventions and limits
// ===========================================================================

#[test]
fn test_term_months_floor_vs_round() {
    let mut input = LoanInput::new(dec!(50000), dec!(0), dec!(0), "BIMESTRAL", dec!(0.09));
    // 7 months at 6 periods per year = 3.5 periods
    input.term_months = Some(7);
    let floored = calculate_schedule(&input).unwrap().result;
    assert_eq!(floored.total_periods, 3);

    input.period_count_rounding = PeriodCountRounding::Round;
    let rounded = calculate_schedule(&input).unwrap().result;
    assert_eq!(rounded.total_periods, 4);
}

#[test]
fn test_unsupported_frequency_fails_closed() {
    let mut input = standard_loan();
    input.frequency = "WEEKLY".into();
    let err = calculate_schedule(&input).unwrap_err();
    assert!(matches!(err, MortgageSimError::UnsupportedFrequency(ref code) if code == "WEEKLY"));
}

#[test]
fn test_missing_rate_input() {
    let mut input = standard_loan();
    input.rates = RateSource::PerYear(vec![]);
    assert!(matches!(
        calculate_schedule(&input),
        Err(MortgageSimError::MissingRateInput(_))
    ));
}

#[test]
fn test_invalid_term() {
    let mut input = standard_loan();
    input.years = dec!(-5);
    assert!(matches!(
        calculate_schedule(&input),
        Err(MortgageSimError::InvalidTerm(_))
    ));
}

#[test]
fn test_schedule_too_large() {
    let mut input = standard_loan();
    input.frequency = "DIARIA".into();
    input.years = dec!(60);
    assert!(matches!(
        calculate_schedule(&input),
        Err(MortgageSimError::ScheduleTooLarge { .. })
    ));

    let tight = EngineSettings {
        max_periods: 120,
        ..EngineSettings::default()
    };
    assert!(matches!(
        calculate_schedule_with(&standard_loan(), &tight),
        Err(MortgageSimError::ScheduleTooLarge { limit: 120, .. })
    ));
}

#[test]
fn test_capitalised_balance_overflow_fails_closed() {
    // 400% a year capitalised for 55 years does not fit in a Decimal
    let mut input = LoanInput::new(dec!(400000), dec!(50000), dec!(60), "ANUAL", dec!(4));
    input.grace = GraceConfig {
        total_periods: 55,
        partial_periods: 0,
    };
    assert!(matches!(
        calculate_schedule(&input),
        Err(MortgageSimError::InvalidInput { .. })
    ));
}

#[test]
fn test_days_in_year_365() {
    let mut input = standard_loan();
    input.days_in_year = 365;
    input.years = dec!(1);
    let r = calculate_schedule(&input).unwrap().result;
    // 365 / 30 periods per year, floored over one year
    assert_eq!(r.total_periods, 12);
    assert!(r.periods_per_year > dec!(12.16) && r.periods_per_year < dec!(12.17));
    // A 30/365 period accrues less than a 30/360 one
    let standard = calculate_schedule(&standard_loan()).unwrap().result;
    assert!(r.rows[0].effective_period_rate < standard.rows[0].effective_period_rate);
}

// ===========================================================================
// Cost overlay
// ===========================================================================

#[test]
fn test_insurance_basis_changes_totals() {
    let mut input = standard_loan();
    input.periodic_costs = PeriodicCosts {
        life_insurance_annual_rate: dec!(0.0036),
        risk_insurance_annual_rate: dec!(0.0024),
        ..PeriodicCosts::default()
    };
    let on_initial = calculate_schedule(&input).unwrap().result;
    input.insurance_basis = InsuranceBasis::FinalBalance;
    let on_final = calculate_schedule(&input).unwrap().result;

    // 0.36% of 350,000 over 12 periods
    assert_eq!(on_initial.rows[0].life_insurance, dec!(105.00));
    assert_eq!(on_initial.rows[0].risk_insurance, dec!(70.00));
    assert!(on_final.total_life_insurance < on_initial.total_life_insurance);
    assert_eq!(on_final.rows[239].life_insurance, Decimal::ZERO);
    // Insurance never changes the amortization itself
    assert_eq!(on_initial.rows[100].installment, on_final.rows[100].installment);
}

#[test]
fn test_total_payment_includes_every_cost() {
    let mut input = standard_loan();
    input.periodic_costs = PeriodicCosts {
        commission: dec!(3.5),
        charges: dec!(2),
        admin_expense: dec!(10),
        life_insurance_annual_rate: dec!(0.0036),
        risk_insurance_annual_rate: Decimal::ZERO,
    };
    let r = calculate_schedule(&input).unwrap().result;
    for row in &r.rows {
        assert_eq!(
            row.total_payment,
            row.installment
                + row.life_insurance
                + row.risk_insurance
                + row.commission
                + row.charges
                + row.admin_expense
        );
        assert_eq!(row.cash_flow, -row.total_payment);
    }
}

#[test]
fn test_payment_dates_when_disbursement_known() {
    let mut input = standard_loan();
    input.years = dec!(1);
    input.disbursement_date = NaiveDate::from_ymd_opt(2025, 3, 1);
    let r = calculate_schedule(&input).unwrap().result;
    assert_eq!(r.rows[0].payment_date, NaiveDate::from_ymd_opt(2025, 3, 31));
    assert_eq!(r.rows[11].payment_date, NaiveDate::from_ymd_opt(2026, 2, 24));
}

#[test]
fn test_result_serialises_to_json() {
    let out = calculate_schedule(&standard_loan()).unwrap();
    let value = serde_json::to_value(&out).unwrap();
    assert_eq!(value["result"]["frequency"], "MENSUAL");
    assert_eq!(value["result"]["rows"][0]["grace_type"], "SIN_PLAZO");
    assert_eq!(value["metadata"]["precision"], "rust_decimal_128bit");
}
