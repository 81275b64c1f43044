use super::common::*;
use crate::workflows::filing::brackets::{compute_tax, marginal_rate};
use crate::workflows::filing::domain::FilingStatus;

#[test]
fn single_2025_bracket_boundaries() {
    let constants = constants();
    let brackets = constants.federal(2025).brackets.get(FilingStatus::Single);

    assert_eq!(compute_tax(11_925.0, brackets), 1_193);
    assert_eq!(compute_tax(48_475.0, brackets), 5_579);
    assert_eq!(compute_tax(65_000.0, brackets), 9_214);
    assert_eq!(marginal_rate(65_000.0, brackets), 0.22);
}

#[test]
fn tax_never_decreases_as_income_rises() {
    let constants = constants();
    for year in constants.known_years() {
        for status in FilingStatus::ordered() {
            let brackets = constants.federal(year).brackets.get(status);
            let mut previous = 0;
            for step in 0..=2_000 {
                let income = step as f64 * 375.0;
                let tax = compute_tax(income, brackets);
                assert!(
                    tax >= previous,
                    "{year} {status:?}: tax fell from {previous} to {tax} at {income}"
                );
                previous = tax;
            }
        }
    }
}

#[test]
fn joint_brackets_are_wider_than_single() {
    let constants = constants();
    let federal = constants.federal(2025);
    let single = compute_tax(150_000.0, federal.brackets.get(FilingStatus::Single));
    let joint = compute_tax(150_000.0, federal.brackets.get(FilingStatus::MarriedFilingJointly));
    assert!(joint < single);
}

#[test]
fn income_within_one_bracket_adds_its_rate() {
    let constants = constants();
    let brackets = constants.federal(2025).brackets.get(FilingStatus::Single);

    assert_eq!(compute_tax(20_000.0, brackets), 2_162);
    assert_eq!(compute_tax(20_100.0, brackets), 2_174);
    assert_eq!(
        compute_tax(31_000.0, brackets) - compute_tax(30_000.0, brackets),
        120
    );

    for (low, high) in [(60_000.0, 61_000.0), (120_000.0, 125_000.0)] {
        let added = compute_tax(high, brackets) - compute_tax(low, brackets);
        let expected = (high - low) * marginal_rate(low, brackets);
        assert!(
            (added as f64 - expected).abs() <= 1.0,
            "{low}..{high}: added {added}, expected {expected}"
        );
    }
}
