use serde::{Deserialize, Serialize};

use super::brackets::compute_tax;
use super::constants::{FederalConstants, FederalTable, PayrollConstants, StateTable, TaxConstants};
use super::domain::{amount, total, DeductionChoice, FilingStatus, StateCode, TaxSession};

/// Income totals by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub wages: f64,
    pub self_employment: f64,
    pub interest: f64,
    pub ordinary_dividends: f64,
    /// Informational; already included in `ordinary_dividends`.
    pub qualified_dividends: f64,
    pub capital_gains: f64,
    pub other: f64,
    pub total: f64,
}

/// Above-the-line adjustments, each already capped at its own limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentBreakdown {
    pub se_deduction: f64,
    pub retirement: f64,
    pub hsa: f64,
    pub student_loan_interest: f64,
    pub se_health_insurance: f64,
    pub educator_expenses: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemizedBreakdown {
    pub mortgage_interest: f64,
    /// State and local taxes after the SALT cap.
    pub state_local_taxes: f64,
    pub charitable: f64,
    pub medical: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditBreakdown {
    pub child_tax_credit: f64,
    pub education: f64,
    pub ev: f64,
    pub childcare: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateComputation {
    pub state: StateCode,
    pub standard_deduction: f64,
    pub taxable_income: f64,
    pub bracket_tax: f64,
    pub surtax: f64,
    pub credit: f64,
    pub total_tax: f64,
    pub withheld: f64,
    /// Positive values are refunds, negative values are amounts owed.
    pub net_result: f64,
}

/// Derived filing values for one session. Always recomputed from the full session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingComputation {
    /// Year of the constants actually applied (after fallback).
    pub tax_year: u16,
    pub filing_status: FilingStatus,
    pub income: IncomeBreakdown,
    pub adjustments: AdjustmentBreakdown,
    pub agi: f64,
    pub deduction_choice: DeductionChoice,
    pub standard_deduction: f64,
    pub itemized: ItemizedBreakdown,
    /// Deduction applied: the standard amount or the itemized total.
    pub deduction: f64,
    pub home_office_deduction: f64,
    pub mileage_deduction: f64,
    pub taxable_income: f64,
    pub federal_income_tax: f64,
    pub credits: CreditBreakdown,
    pub income_tax_after_credits: f64,
    pub se_tax: f64,
    pub total_tax: f64,
    pub total_withheld: f64,
    /// Positive values are refunds, negative values are amounts owed.
    pub net_result: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateComputation>,
}

impl FilingComputation {
    pub fn compute(session: &TaxSession, constants: &TaxConstants) -> Self {
        let (federal, state) =
            constants.lookup(session.tax_year, session.state, session.filing_status);
        compute_filing(session, &federal, state.as_ref())
    }

    pub fn is_refund(&self) -> bool {
        self.net_result > 0.0
    }
}

/// Run the full federal pass and, when a state table is given, the state pass.
pub fn compute_filing(
    session: &TaxSession,
    federal: &FederalTable,
    state: Option<&StateTable>,
) -> FilingComputation {
    let constants = federal.constants;
    let status = session.filing_status;
    let manual = &session.manual;

    let income = income_breakdown(session);

    let se_tax = self_employment_tax(income.self_employment, &constants.payroll);
    let se_deduction = (se_tax * 0.5).floor();

    let student_loan_interest = manual.student_loan_interest
        + total(
            session
                .student_loan_forms()
                .map(|(_, form)| amount(form.student_loan_interest)),
        );
    let educator_expenses = if manual.is_educator {
        manual
            .educator_expenses
            .min(constants.limits.educator_expense)
    } else {
        0.0
    };
    let mut adjustments = AdjustmentBreakdown {
        se_deduction,
        retirement: manual.retirement_contributions.min(constants.limits.ira),
        hsa: manual
            .hsa_contributions
            .min(constants.limits.hsa(manual.hsa_family_coverage)),
        student_loan_interest: student_loan_interest
            .min(constants.limits.student_loan_interest),
        se_health_insurance: manual.se_health_insurance,
        educator_expenses,
        total: 0.0,
    };
    adjustments.total = adjustments.se_deduction
        + adjustments.retirement
        + adjustments.hsa
        + adjustments.student_loan_interest
        + adjustments.se_health_insurance
        + adjustments.educator_expenses;

    let agi = income.total - adjustments.total;

    let itemized = itemized_breakdown(session, constants);
    let deduction = match session.deduction_choice {
        DeductionChoice::Standard => federal.standard_deduction,
        DeductionChoice::Itemized => itemized.total,
    };

    let home_office_deduction =
        manual.home_office_sqft.clamp(0.0, constants.home_office_max_sqft) * constants.home_office_rate;
    let mileage_deduction = (manual.business_miles * constants.mileage_rate).round();
    let taxable_income =
        (agi - deduction - home_office_deduction - mileage_deduction).max(0.0);

    let federal_income_tax = compute_tax(taxable_income, federal.brackets) as f64;
    let credits = credit_breakdown(session, constants, status, agi);
    let income_tax_after_credits = (federal_income_tax - credits.total).max(0.0);
    let total_tax = income_tax_after_credits + se_tax;

    let total_withheld = total(
        session
            .incomes
            .iter()
            .map(|record| record.document.federal_withholding()),
    ) + manual.estimated_payments;

    let state = state.map(|table| compute_state(session, table, agi));

    FilingComputation {
        tax_year: constants.year,
        filing_status: status,
        income,
        adjustments,
        agi,
        deduction_choice: session.deduction_choice,
        standard_deduction: federal.standard_deduction,
        itemized,
        deduction,
        home_office_deduction,
        mileage_deduction,
        taxable_income,
        federal_income_tax,
        credits,
        income_tax_after_credits,
        se_tax,
        total_tax,
        total_withheld,
        net_result: total_withheld - total_tax,
        state,
    }
}

pub fn income_breakdown(session: &TaxSession) -> IncomeBreakdown {
    let wages = total(session.w2s().map(|(_, form)| amount(form.wages)));
    let self_employment = total(
        session
            .necs()
            .map(|(_, form)| amount(form.nonemployee_compensation)),
    );
    let interest = total(
        session
            .interest_forms()
            .map(|(_, form)| amount(form.interest_income)),
    );
    let ordinary_dividends = total(
        session
            .dividend_forms()
            .map(|(_, form)| amount(form.ordinary_dividends)),
    );
    let qualified_dividends = total(
        session
            .dividend_forms()
            .map(|(_, form)| amount(form.qualified_dividends)),
    );
    let capital_gains = total(session.brokerage_forms().map(|(_, form)| form.net_gain()))
        + session.manual.capital_gains;
    let other = session.manual.other_income;

    IncomeBreakdown {
        wages,
        self_employment,
        interest,
        ordinary_dividends,
        qualified_dividends,
        capital_gains,
        other,
        total: wages + self_employment + interest + ordinary_dividends + capital_gains + other,
    }
}

/// round(net-earnings factor × SE income × SE rate); negative SE income owes nothing.
pub fn self_employment_tax(se_income: f64, payroll: &PayrollConstants) -> f64 {
    (se_income.max(0.0) * payroll.se_earnings_factor * payroll.se_tax_rate).round()
}

pub fn itemized_breakdown(session: &TaxSession, constants: &FederalConstants) -> ItemizedBreakdown {
    let manual = &session.manual;
    let mortgage_interest = manual.mortgage_interest
        + total(
            session
                .mortgage_forms()
                .map(|(_, form)| amount(form.mortgage_interest)),
        );
    let state_local_paid = state_local_taxes_paid(session);
    let state_local_taxes = state_local_paid.min(constants.salt_cap.get(session.filing_status));
    let charitable = manual.charitable_contributions;
    let medical = manual.medical_expenses;

    ItemizedBreakdown {
        mortgage_interest,
        state_local_taxes,
        charitable,
        medical,
        total: mortgage_interest + state_local_taxes + charitable + medical,
    }
}

/// State/local taxes paid before the SALT cap, including 1098 property taxes.
pub fn state_local_taxes_paid(session: &TaxSession) -> f64 {
    session.manual.state_local_taxes_paid
        + total(
            session
                .mortgage_forms()
                .map(|(_, form)| amount(form.property_taxes)),
        )
}

pub fn qualified_education_expenses(session: &TaxSession) -> f64 {
    session.manual.education_expenses
        + total(
            session
                .tuition_forms()
                .map(|(_, form)| form.net_qualified_expenses()),
        )
}

/// Child tax credit plus the other-dependent credit after the income phase-out.
pub fn child_tax_credit(session: &TaxSession, constants: &FederalConstants, agi: f64) -> f64 {
    let credits = &constants.credits;
    let dependents = &session.dependents;
    let base = credits.child_tax_credit * dependents.children_under_17 as f64
        + credits.other_dependent_credit * dependents.other_dependents as f64;
    if base <= 0.0 {
        return 0.0;
    }

    let threshold = credits.ctc_phaseout_threshold.get(session.filing_status);
    let excess = (agi - threshold).max(0.0);
    let reduction = (excess / credits.ctc_phaseout_step).ceil() * credits.ctc_phaseout_reduction;
    (base - reduction).max(0.0)
}

fn credit_breakdown(
    session: &TaxSession,
    constants: &FederalConstants,
    status: FilingStatus,
    agi: f64,
) -> CreditBreakdown {
    let credits = &constants.credits;
    let manual = &session.manual;

    let child_tax_credit = child_tax_credit(session, constants, agi);

    let qualified = qualified_education_expenses(session);
    let education = if qualified <= 0.0 || agi > credits.aotc_income_limit.get(status) {
        0.0
    } else {
        let full = qualified.min(credits.aotc_full_tier);
        let partial = (qualified - credits.aotc_full_tier)
            .clamp(0.0, credits.aotc_partial_tier)
            * credits.aotc_partial_rate;
        (full + partial).round()
    };

    let ev = if manual.ev_purchase && agi <= credits.ev_income_limit.get(status) {
        credits.ev_credit
    } else {
        0.0
    };

    let childcare_cap = match session.dependents.childcare_dependents {
        0 => 0.0,
        1 => credits.childcare_cap_one,
        _ => credits.childcare_cap_two_or_more,
    };
    let childcare =
        (manual.childcare_expenses.clamp(0.0, childcare_cap) * credits.childcare_rate).round();

    CreditBreakdown {
        child_tax_credit,
        education,
        ev,
        childcare,
        total: child_tax_credit + education + ev + childcare,
    }
}

/// State pass: the state standard deduction always applies, even when federal itemizes.
pub fn compute_state(session: &TaxSession, table: &StateTable, agi: f64) -> StateComputation {
    let taxable_income = (agi - table.standard_deduction).max(0.0);
    let bracket_tax = compute_tax(taxable_income, table.brackets) as f64;
    let surtax = table
        .constants
        .surtax
        .map(|surtax| surtax.compute(taxable_income))
        .unwrap_or(0.0);

    let credit = match table.renters_credit() {
        Some((credit, agi_limit)) if session.manual.is_renter && agi <= agi_limit => credit,
        _ => 0.0,
    };

    let total_tax = (bracket_tax + surtax - credit).max(0.0);
    let withheld = total(
        session
            .incomes
            .iter()
            .map(|record| record.document.state_withholding()),
    ) + session.manual.state_estimated_payments;

    StateComputation {
        state: table.state(),
        standard_deduction: table.standard_deduction,
        taxable_income,
        bracket_tax,
        surtax,
        credit,
        total_tax,
        withheld,
        net_result: withheld - total_tax,
    }
}
