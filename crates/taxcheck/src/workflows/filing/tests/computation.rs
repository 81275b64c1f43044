use super::common::*;
use crate::workflows::filing::computation::{self_employment_tax, FilingComputation};
use crate::workflows::filing::domain::{DeductionChoice, FilingStatus, StateCode, TaxSession};

#[test]
fn single_w2_filer_owes_a_small_balance() {
    let filing = FilingComputation::compute(&w2_session(), &constants());

    assert_eq!(filing.tax_year, 2025);
    assert_eq!(filing.agi, 80_000.0);
    assert_eq!(filing.deduction, filing.standard_deduction);
    assert_eq!(filing.taxable_income, 65_000.0);
    assert_eq!(filing.federal_income_tax, 9_214.0);
    assert_eq!(filing.total_withheld, 9_000.0);
    assert_eq!(filing.net_result, -214.0);
    assert!(!filing.is_refund());
    assert!(filing.state.is_none());
}

#[test]
fn self_employment_tax_and_half_deduction() {
    let constants = constants();
    let payroll = &constants.federal(2025).payroll;
    assert_eq!(self_employment_tax(100_000.0, payroll), 14_130.0);
    assert_eq!(self_employment_tax(-5_000.0, payroll), 0.0);

    let filing = FilingComputation::compute(&nec_session(100_000.0), &constants);
    assert_eq!(filing.se_tax, 14_130.0);
    assert_eq!(filing.adjustments.se_deduction, 7_065.0);
    assert_eq!(filing.agi, 100_000.0 - 7_065.0);
    assert_eq!(
        filing.total_tax,
        filing.income_tax_after_credits + filing.se_tax
    );
}

#[test]
fn recomputation_is_idempotent() {
    let constants = constants();
    let mut session = w2_session();
    let first = FilingComputation::compute(&session, &constants);
    session.filing = Some(first.clone());
    let second = FilingComputation::compute(&session, &constants);
    assert_eq!(first, second);
}

#[test]
fn replacing_a_document_does_not_double_count() {
    let constants = constants();
    let mut session = w2_session();
    let replaced = session.upsert_income(w2_record("w2-acme", 82_000.0, 9_300.0));

    assert!(replaced);
    assert_eq!(session.incomes.len(), 1);
    let filing = FilingComputation::compute(&session, &constants);
    assert_eq!(filing.income.wages, 82_000.0);
    assert_eq!(filing.total_withheld, 9_300.0);
}

#[test]
fn itemized_choice_uses_itemized_total() {
    let mut session = w2_session();
    session.deduction_choice = DeductionChoice::Itemized;
    session.manual.mortgage_interest = 12_000.0;
    session.manual.state_local_taxes_paid = 4_000.0;
    session.manual.charitable_contributions = 2_500.0;

    let filing = FilingComputation::compute(&session, &constants());
    assert_eq!(filing.itemized.total, 18_500.0);
    assert_eq!(filing.deduction, 18_500.0);
    assert_eq!(filing.taxable_income, 80_000.0 - 18_500.0);
}

#[test]
fn child_credit_reduces_income_tax_but_not_below_zero() {
    let mut session = TaxSession::new(2025, FilingStatus::HeadOfHousehold);
    session.upsert_income(w2_record("w2-low", 30_000.0, 500.0));
    session.dependents.children_under_17 = 3;

    let filing = FilingComputation::compute(&session, &constants());
    assert!(filing.credits.child_tax_credit > filing.federal_income_tax);
    assert_eq!(filing.income_tax_after_credits, 0.0);
}

#[test]
fn state_pass_uses_state_standard_deduction() {
    let constants = constants();
    let filing = FilingComputation::compute(&california_w2_session(), &constants);
    let state = filing.state.expect("california computed");
    let table = constants
        .state(2025, StateCode::California)
        .expect("california table");

    assert_eq!(state.state, StateCode::California);
    assert_eq!(
        state.taxable_income,
        80_000.0 - table.standard_deduction.get(FilingStatus::Single)
    );
    assert_eq!(state.surtax, 0.0);
    assert_eq!(state.total_tax, state.bracket_tax - state.credit);
}

#[test]
fn untabulated_year_uses_latest_constants() {
    let constants = constants();
    let mut session = w2_session();
    session.tax_year = 2031;
    let filing = FilingComputation::compute(&session, &constants);
    assert_eq!(filing.tax_year, constants.latest_year());
}

#[test]
fn adjustments_are_capped_independently() {
    let mut session = w2_session();
    session.manual.retirement_contributions = 9_000.0;
    session.manual.hsa_contributions = 6_000.0;
    session.manual.student_loan_interest = 3_200.0;

    let filing = FilingComputation::compute(&session, &constants());
    let adjustments = &filing.adjustments;
    assert_eq!(adjustments.retirement, 7_000.0);
    assert_eq!(adjustments.hsa, 4_300.0);
    assert_eq!(adjustments.student_loan_interest, 2_500.0);
    assert_eq!(adjustments.total, 13_800.0);
    assert_eq!(filing.agi, 80_000.0 - 13_800.0);

    session.manual.hsa_family_coverage = true;
    session.manual.hsa_contributions = 10_000.0;
    let filing = FilingComputation::compute(&session, &constants());
    assert_eq!(filing.adjustments.hsa, 8_550.0);
    assert_eq!(filing.adjustments.retirement, 7_000.0);
}

#[test]
fn salt_is_capped_by_filing_status() {
    let mut session = w2_session();
    session.deduction_choice = DeductionChoice::Itemized;
    session.manual.state_local_taxes_paid = 14_000.0;
    session.manual.mortgage_interest = 9_000.0;

    let filing = FilingComputation::compute(&session, &constants());
    assert_eq!(filing.itemized.state_local_taxes, 10_000.0);
    assert_eq!(filing.itemized.total, 19_000.0);
    assert_eq!(filing.deduction, 19_000.0);

    session.filing_status = FilingStatus::MarriedFilingSeparately;
    let filing = FilingComputation::compute(&session, &constants());
    assert_eq!(filing.itemized.state_local_taxes, 5_000.0);
}

#[test]
fn california_surtax_applies_above_one_million() {
    let constants = constants();
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.state = Some(StateCode::California);
    // 5,706 is the 2025 single state standard deduction.
    session.upsert_income(w2_record("w2-big", 2_075_706.0, 600_000.0));

    let filing = FilingComputation::compute(&session, &constants);
    let state = filing.state.expect("california computed");
    assert_eq!(state.taxable_income, 2_070_000.0);
    assert_eq!(state.surtax, 10_700.0);
    assert_eq!(state.total_tax, state.bracket_tax + state.surtax);
}

#[test]
fn california_renters_credit_respects_agi_limit() {
    let constants = constants();
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.state = Some(StateCode::California);
    session.manual.is_renter = true;
    session.upsert_income(w2_record("w2-low", 40_000.0, 3_000.0));

    let state = FilingComputation::compute(&session, &constants)
        .state
        .expect("california computed");
    assert_eq!(state.credit, 60.0);
    assert_eq!(state.total_tax, state.bracket_tax - 60.0);

    session.upsert_income(w2_record("w2-low", 60_000.0, 4_500.0));
    let state = FilingComputation::compute(&session, &constants)
        .state
        .expect("california computed");
    assert_eq!(state.credit, 0.0);

    session.manual.is_renter = false;
    session.upsert_income(w2_record("w2-low", 40_000.0, 3_000.0));
    let state = FilingComputation::compute(&session, &constants)
        .state
        .expect("california computed");
    assert_eq!(state.credit, 0.0);
}

#[test]
fn empty_totals_serialize_as_positive_zero() {
    let filing = FilingComputation::compute(&w2_session(), &constants());
    assert!(filing.income.self_employment.is_sign_positive());
    assert!(filing.adjustments.se_deduction.is_sign_positive());
    assert!(filing.itemized.mortgage_interest.is_sign_positive());

    let blank = TaxSession::new(2025, FilingStatus::Single);
    let json = serde_json::to_string(&FilingComputation::compute(&blank, &constants()))
        .expect("computation serializes");
    assert!(!json.contains("-0.0"), "{json}");
}
