use super::super::domain::TaxSession;
use super::verdict::{Verdict, VerdictStatus};

/// Whole-dollar tolerance used for values the computation rounds.
pub(crate) const DOLLAR: f64 = 1.0;

pub(crate) const NOT_COMPUTED: &str = "filing has not been computed for this session";

pub(crate) const NO_INPUTS: &str = "session has no income records or entered amounts yet";

/// True once the session holds an income record or any nonzero entered amount.
pub(crate) fn has_inputs(session: &TaxSession) -> bool {
    if !session.incomes.is_empty() {
        return true;
    }
    let manual = &session.manual;
    [
        manual.capital_gains,
        manual.other_income,
        manual.retirement_contributions,
        manual.hsa_contributions,
        manual.student_loan_interest,
        manual.se_health_insurance,
        manual.educator_expenses,
        manual.mortgage_interest,
        manual.state_local_taxes_paid,
        manual.charitable_contributions,
        manual.medical_expenses,
        manual.home_office_sqft,
        manual.business_miles,
        manual.childcare_expenses,
        manual.education_expenses,
        manual.estimated_payments,
        manual.state_estimated_payments,
    ]
    .iter()
    .any(|value| *value != 0.0)
}

pub fn approx_eq(left: f64, right: f64, tolerance: f64) -> bool {
    (left - right).abs() <= tolerance
}

/// `$12,345` for whole amounts, `$12,345.67` otherwise; negatives render as `-$12,345`.
pub fn money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = group_thousands(cents / 100);
    match cents % 100 {
        0 => format!("{sign}${dollars}"),
        fraction => format!("{sign}${dollars}.{fraction:02}"),
    }
}

pub fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Compare a computed amount against its independently derived expectation.
pub(crate) fn compare_amounts(
    what: &str,
    current: f64,
    expected: f64,
    tolerance: f64,
    mismatch: VerdictStatus,
) -> Verdict {
    if approx_eq(current, expected, tolerance) {
        Verdict::pass(
            money(current),
            money(expected),
            format!("{what} agrees with the source amounts"),
        )
    } else {
        Verdict::with_status(
            mismatch,
            money(current),
            money(expected),
            format!("{what} is off by {}", money(current - expected)),
        )
    }
}

/// Flag amounts above a statutory ceiling.
pub(crate) fn check_ceiling(
    what: &str,
    current: f64,
    ceiling: f64,
    over: VerdictStatus,
) -> Verdict {
    if current <= ceiling + 0.005 {
        Verdict::pass(
            money(current),
            format!("<= {}", money(ceiling)),
            format!("{what} is within the {} limit", money(ceiling)),
        )
    } else {
        Verdict::with_status(
            over,
            money(current),
            format!("<= {}", money(ceiling)),
            format!("{what} exceeds the limit by {}", money(current - ceiling)),
        )
    }
}

/// Relative tolerance with a one-dollar floor.
pub(crate) fn tolerance_for(expected: f64, share: f64) -> f64 {
    (expected.abs() * share).max(DOLLAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_and_signs() {
        assert_eq!(money(0.0), "$0");
        assert_eq!(money(1_193.0), "$1,193");
        assert_eq!(money(1_234_567.5), "$1,234,567.50");
        assert_eq!(money(-214.0), "-$214");
    }

    #[test]
    fn inputs_come_from_records_or_entered_amounts() {
        use crate::workflows::filing::domain::FilingStatus;

        let mut session = TaxSession::new(2025, FilingStatus::Single);
        assert!(!has_inputs(&session));
        session.manual.is_renter = true;
        assert!(!has_inputs(&session));
        session.manual.estimated_payments = 500.0;
        assert!(has_inputs(&session));
    }

    #[test]
    fn ceiling_check_reports_overage() {
        let verdict = check_ceiling("IRA contributions", 7_500.0, 7_000.0, VerdictStatus::Fail);
        assert_eq!(verdict.status, VerdictStatus::Fail);
        assert!(verdict.detail.contains("$500"));
    }
}
