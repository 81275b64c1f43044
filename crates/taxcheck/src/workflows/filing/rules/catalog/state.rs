use super::super::super::brackets::compute_tax;
use super::super::super::domain::{amount, DeductionChoice, StateCode};
use super::super::registry::{Citation, RuleDescriptor, RuleKind, RuleStage, Severity};
use super::super::support::{compare_amounts, has_inputs, money, DOLLAR, NOT_COMPUTED, NO_INPUTS};
use super::super::verdict::{EvaluationError, Verdict, VerdictStatus};
use super::super::RuleContext;
use super::{CALIFORNIA, STATE, STATE_NEC, STATE_W2};

type Outcome = Result<Verdict, EvaluationError>;

pub(super) fn rules() -> Vec<RuleDescriptor> {
    vec![
        RuleDescriptor {
            id: "state-tax-brackets",
            name: "State income tax follows bracket table",
            citation: Citation::new("State tax code", "State resident return", "Tax line"),
            scenarios: STATE,
            stage: RuleStage::Computation,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: state_tax_brackets,
        },
        RuleDescriptor {
            id: "state-standard-deduction",
            name: "State standard deduction matches filing status",
            citation: Citation::new("State tax code", "State resident return", "Deduction line"),
            scenarios: STATE,
            stage: RuleStage::Deductions,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: state_standard_deduction,
        },
        RuleDescriptor {
            id: "state-withholding-total",
            name: "State withholding matches documents",
            citation: Citation::new("State tax code", "State resident return", "Payments"),
            scenarios: STATE,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: state_withholding_total,
        },
        RuleDescriptor {
            id: "state-wages-match",
            name: "State wages agree with federal wages",
            citation: Citation::new("State tax code", "Form W-2", "Box 16"),
            scenarios: STATE_W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: state_wages_match,
        },
        RuleDescriptor {
            id: "w2-state-residence",
            name: "W-2 state matches filing state",
            citation: Citation::new("State tax code", "Form W-2", "Box 15"),
            scenarios: STATE_W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: w2_state_residence,
        },
        RuleDescriptor {
            id: "nec-state-income-match",
            name: "1099-NEC state income agrees with compensation",
            citation: Citation::new("State tax code", "Form 1099-NEC", "Box 7"),
            scenarios: STATE_NEC,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: nec_state_income_match,
        },
        RuleDescriptor {
            id: "ca-mental-health-surtax",
            name: "California mental health services tax",
            citation: Citation::new("CA R&TC §17043", "Form 540", "Line 62"),
            scenarios: CALIFORNIA,
            stage: RuleStage::Computation,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: ca_mental_health_surtax,
        },
        RuleDescriptor {
            id: "ca-renters-credit",
            name: "California nonrefundable renter's credit",
            citation: Citation::new("CA R&TC §17053.5", "Form 540", "Line 46"),
            scenarios: CALIFORNIA,
            stage: RuleStage::Credits,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: ca_renters_credit,
        },
        RuleDescriptor {
            id: "state-itemize-divergence",
            name: "State deduction differs from federal choice",
            citation: Citation::new("State tax code", "State resident return", "Deduction line"),
            scenarios: STATE,
            stage: RuleStage::Deductions,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: state_itemize_divergence,
        },
    ]
}

fn state_tax_brackets(ctx: &RuleContext<'_>) -> Outcome {
    let (Some(table), Some(filing)) = (ctx.state, ctx.filing) else {
        return Ok(Verdict::skip("no state return computed"));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let Some(state) = filing.state.as_ref() else {
        return Ok(Verdict::skip("no state return computed"));
    };
    let expected = compute_tax(state.taxable_income, table.brackets) as f64;
    Ok(compare_amounts(
        &format!("{} bracket tax", table.state().label()),
        state.bracket_tax,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn state_standard_deduction(ctx: &RuleContext<'_>) -> Outcome {
    let (Some(table), Some(filing)) = (ctx.state, ctx.filing) else {
        return Ok(Verdict::skip("no state return computed"));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let Some(state) = filing.state.as_ref() else {
        return Ok(Verdict::skip("no state return computed"));
    };
    let expected = table
        .constants
        .standard_deduction
        .get(ctx.session.filing_status);
    Ok(compare_amounts(
        &format!("{} standard deduction", table.state().label()),
        state.standard_deduction,
        expected,
        0.0,
        VerdictStatus::Fail,
    ))
}

fn state_withholding_total(ctx: &RuleContext<'_>) -> Outcome {
    if ctx.state.is_none() {
        return Ok(Verdict::skip("no filing state selected"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let Some(state) = filing.state.as_ref() else {
        return Ok(Verdict::skip("no state return computed"));
    };
    let session = ctx.session;
    let expected = session
        .incomes
        .iter()
        .map(|record| record.document.state_withholding())
        .sum::<f64>()
        + session.manual.state_estimated_payments;
    Ok(compare_amounts(
        "State payments",
        state.withheld,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn state_wages_match(ctx: &RuleContext<'_>) -> Outcome {
    let pairs = ctx
        .session
        .w2s()
        .filter_map(|(_, form)| match (form.wages, form.state_wages) {
            (Some(wages), Some(state_wages)) => Some((
                form.employer_name.as_deref().unwrap_or("employer"),
                wages,
                state_wages,
            )),
            _ => None,
        })
        .collect::<Vec<_>>();
    if pairs.is_empty() {
        return Ok(Verdict::skip("no W-2 reports both federal and state wages"));
    }
    let federal = pairs.iter().map(|(_, wages, _)| wages).sum::<f64>();
    let state = pairs.iter().map(|(_, _, state)| state).sum::<f64>();
    let differing = pairs
        .iter()
        .filter(|(_, wages, state)| (wages - state).abs() > DOLLAR)
        .map(|(employer, _, _)| *employer)
        .collect::<Vec<_>>();
    if differing.is_empty() {
        Ok(Verdict::pass(
            money(state),
            money(federal),
            "state wages match federal wages",
        ))
    } else {
        Ok(Verdict::warn(
            money(state),
            money(federal),
            format!(
                "state wages differ from box 1 on: {}; pre-tax benefits can cause differences between federal and state wages",
                differing.join(", ")
            ),
        ))
    }
}

fn w2_state_residence(ctx: &RuleContext<'_>) -> Outcome {
    let Some(code) = ctx.session.state else {
        return Ok(Verdict::skip("no filing state selected"));
    };
    let states = ctx
        .session
        .w2s()
        .filter_map(|(_, form)| {
            form.state
                .as_deref()
                .map(|state| (form.employer_name.as_deref().unwrap_or("employer"), state))
        })
        .collect::<Vec<_>>();
    if states.is_empty() {
        return Ok(Verdict::skip("no W-2 reports a state"));
    }
    let other = states
        .iter()
        .filter(|(_, state)| state.parse::<StateCode>().ok() != Some(code))
        .map(|(employer, state)| format!("{employer} ({state})"))
        .collect::<Vec<_>>();
    if other.is_empty() {
        Ok(Verdict::pass(
            code.abbreviation(),
            code.abbreviation(),
            "every W-2 reports the filing state",
        ))
    } else {
        Ok(Verdict::warn(
            other.join(", "),
            code.abbreviation(),
            "wages were earned in another state; a nonresident return or credit for taxes paid may be needed",
        ))
    }
}

fn nec_state_income_match(ctx: &RuleContext<'_>) -> Outcome {
    let pairs = ctx
        .session
        .necs()
        .filter_map(|(record, form)| {
            form.state_income
                .map(|state| (record, amount(form.nonemployee_compensation), state))
        })
        .collect::<Vec<_>>();
    if pairs.is_empty() {
        return Ok(Verdict::skip("no 1099-NEC reports state income"));
    }
    let federal = pairs.iter().map(|(_, comp, _)| comp).sum::<f64>();
    let state = pairs.iter().map(|(_, _, state)| state).sum::<f64>();
    Ok(compare_amounts(
        "1099-NEC state income",
        state,
        federal,
        DOLLAR,
        VerdictStatus::Warn,
    ))
}

fn ca_mental_health_surtax(ctx: &RuleContext<'_>) -> Outcome {
    let (Some(table), Some(filing)) = (ctx.state, ctx.filing) else {
        return Ok(Verdict::skip("no state return computed"));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    if table.state() != StateCode::California {
        return Ok(Verdict::skip("filing state is not California"));
    }
    let Some(state) = filing.state.as_ref() else {
        return Ok(Verdict::skip("no state return computed"));
    };
    let Some(surtax) = table.constants.surtax else {
        return Err(EvaluationError::MissingField("california surtax"));
    };
    let expected = surtax.compute(state.taxable_income);
    Ok(compare_amounts(
        surtax.name,
        state.surtax,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn ca_renters_credit(ctx: &RuleContext<'_>) -> Outcome {
    let (Some(table), Some(filing)) = (ctx.state, ctx.filing) else {
        return Ok(Verdict::skip("no state return computed"));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    if table.state() != StateCode::California {
        return Ok(Verdict::skip("filing state is not California"));
    }
    let Some((credit, agi_limit)) = table.renters_credit() else {
        return Err(EvaluationError::MissingField("california renter's credit"));
    };
    let claimed = filing
        .state
        .as_ref()
        .map(|state| state.credit)
        .unwrap_or(0.0);
    let session = ctx.session;
    let limit = format!("AGI <= {}", money(agi_limit));

    if session.manual.is_renter {
        if filing.agi > agi_limit {
            return Ok(Verdict::warn(
                money(claimed),
                limit,
                "renter's credit is unavailable above the AGI limit",
            ));
        }
        return Ok(Verdict::pass(
            money(claimed),
            money(credit),
            "renter's credit applied",
        ));
    }
    if filing.agi <= agi_limit && !session.answered("isRenter") {
        return Ok(Verdict::warn(
            money(0.0),
            money(credit),
            format!(
                "income qualifies for the {} renter's credit if the filer rented their home for at least half the year",
                money(credit)
            ),
        ));
    }
    Ok(Verdict::skip("filer does not rent or is above the AGI limit"))
}

fn state_itemize_divergence(ctx: &RuleContext<'_>) -> Outcome {
    let (Some(table), Some(filing)) = (ctx.state, ctx.filing) else {
        return Ok(Verdict::skip("no state return computed"));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    if filing.deduction_choice != DeductionChoice::Itemized {
        return Ok(Verdict::pass(
            "standard",
            "standard",
            "federal and state both use the standard deduction",
        ));
    }
    Ok(Verdict::warn(
        money(table.standard_deduction),
        money(filing.itemized.total),
        format!(
            "federal itemizes but the {} estimate uses the state standard deduction; state itemizing may lower state tax",
            table.state().label()
        ),
    ))
}
