use super::super::super::computation::{child_tax_credit, qualified_education_expenses};
use super::super::super::domain::{DocumentType, FilingStatus};
use super::super::registry::{Citation, RuleDescriptor, RuleKind, RuleStage, Severity};
use super::super::support::{compare_amounts, money, DOLLAR, NOT_COMPUTED};
use super::super::verdict::{EvaluationError, Verdict, VerdictStatus};
use super::super::RuleContext;
use super::FEDERAL;

type Outcome = Result<Verdict, EvaluationError>;

pub(super) fn rules() -> Vec<RuleDescriptor> {
    vec![
        RuleDescriptor {
            id: "child-tax-credit-amount",
            name: "Child tax credit per qualifying child",
            citation: Citation::new("IRC §24(a)", "Schedule 8812", "Line 8"),
            scenarios: FEDERAL,
            stage: RuleStage::Credits,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: child_tax_credit_amount,
        },
        RuleDescriptor {
            id: "child-tax-credit-phaseout",
            name: "Child tax credit income phase-out",
            citation: Citation::new("IRC §24(b)", "Schedule 8812", "Line 12"),
            scenarios: FEDERAL,
            stage: RuleStage::Credits,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: child_tax_credit_phaseout,
        },
        RuleDescriptor {
            id: "childcare-expense-cap",
            name: "Dependent care expenses within cap",
            citation: Citation::new("IRC §21(c)", "Form 2441", "Line 3"),
            scenarios: FEDERAL,
            stage: RuleStage::Credits,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: childcare_expense_cap,
        },
        RuleDescriptor {
            id: "ev-credit-income-limit",
            name: "Clean vehicle credit income limit",
            citation: Citation::new("IRC §30D(f)(10)", "Form 8936", "Part II"),
            scenarios: FEDERAL,
            stage: RuleStage::Credits,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: ev_credit_income_limit,
        },
        RuleDescriptor {
            id: "education-credit-documentation",
            name: "Education credit backed by 1098-T",
            citation: Citation::new("IRC §25A(g)(8)", "Form 8863", "Part III"),
            scenarios: FEDERAL,
            stage: RuleStage::Credits,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: education_credit_documentation,
        },
        RuleDescriptor {
            id: "education-credit-filing-status",
            name: "Education credit unavailable when filing separately",
            citation: Citation::new("IRC §25A(g)(6)", "Form 8863", "Line 1"),
            scenarios: FEDERAL,
            stage: RuleStage::Credits,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: education_credit_filing_status,
        },
        RuleDescriptor {
            id: "nonrefundable-credit-excess",
            name: "Credits absorbed by income tax",
            citation: Citation::new("IRC §26(a)", "Form 1040", "Line 22"),
            scenarios: FEDERAL,
            stage: RuleStage::Credits,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: nonrefundable_credit_excess,
        },
    ]
}

fn child_tax_credit_amount(ctx: &RuleContext<'_>) -> Outcome {
    let dependents = &ctx.session.dependents;
    if dependents.children_under_17 == 0 && dependents.other_dependents == 0 {
        return Ok(Verdict::skip("no dependents listed"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let expected = child_tax_credit(ctx.session, ctx.constants(), filing.agi);
    Ok(compare_amounts(
        "Child and other dependent credit",
        filing.credits.child_tax_credit,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn child_tax_credit_phaseout(ctx: &RuleContext<'_>) -> Outcome {
    let dependents = &ctx.session.dependents;
    if dependents.children_under_17 == 0 && dependents.other_dependents == 0 {
        return Ok(Verdict::skip("no dependents listed"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let credits = &ctx.constants().credits;
    let threshold = credits.ctc_phaseout_threshold.get(ctx.session.filing_status);
    if filing.agi > threshold {
        let full = credits.child_tax_credit * f64::from(dependents.children_under_17)
            + credits.other_dependent_credit * f64::from(dependents.other_dependents);
        Ok(Verdict::warn(
            money(filing.agi),
            format!("<= {}", money(threshold)),
            format!(
                "income above {} reduces the credit from {} to {}",
                money(threshold),
                money(full),
                money(filing.credits.child_tax_credit)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(filing.agi),
            format!("<= {}", money(threshold)),
            "income is below the child tax credit phase-out",
        ))
    }
}

fn childcare_expense_cap(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    let expenses = session.manual.childcare_expenses;
    if expenses <= 0.0 {
        return Ok(Verdict::skip("no dependent care expenses entered"));
    }
    let credits = &ctx.constants().credits;
    let cap = match session.dependents.childcare_dependents {
        0 => {
            return Ok(Verdict::fail(
                money(expenses),
                "qualifying dependent under 13",
                "dependent care expenses were entered without a qualifying dependent",
            ))
        }
        1 => credits.childcare_cap_one,
        _ => credits.childcare_cap_two_or_more,
    };
    if expenses > cap {
        Ok(Verdict::warn(
            money(expenses),
            format!("<= {}", money(cap)),
            format!("only {} of dependent care expenses qualifies for the credit", money(cap)),
        ))
    } else {
        Ok(Verdict::pass(
            money(expenses),
            format!("<= {}", money(cap)),
            "dependent care expenses are within the credit cap",
        ))
    }
}

fn ev_credit_income_limit(ctx: &RuleContext<'_>) -> Outcome {
    if !ctx.session.manual.ev_purchase {
        return Ok(Verdict::skip("no clean vehicle purchase"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let limit = ctx
        .constants()
        .credits
        .ev_income_limit
        .get(ctx.session.filing_status);
    if filing.agi > limit {
        Ok(Verdict::warn(
            money(filing.agi),
            format!("<= {}", money(limit)),
            format!(
                "income above {} makes the clean vehicle credit unavailable",
                money(limit)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(filing.agi),
            format!("<= {}", money(limit)),
            "income is within the clean vehicle credit limit",
        ))
    }
}

fn education_credit_documentation(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    if qualified_education_expenses(session) <= 0.0 {
        return Ok(Verdict::skip("no education expenses on file"));
    }
    if session.has_document(DocumentType::Form1098T) {
        Ok(Verdict::pass(
            "1098-T on file",
            "1098-T on file",
            "education expenses are supported by a 1098-T",
        ))
    } else {
        Ok(Verdict::warn(
            money(session.manual.education_expenses),
            "1098-T on file",
            "education credits generally require a 1098-T from the institution",
        ))
    }
}

fn education_credit_filing_status(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    if qualified_education_expenses(session) <= 0.0 {
        return Ok(Verdict::skip("no education expenses on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if session.filing_status != FilingStatus::MarriedFilingSeparately {
        return Ok(Verdict::pass(
            money(filing.credits.education),
            "eligible status",
            "filing status allows education credits",
        ));
    }
    if filing.credits.education > 0.0 {
        Ok(Verdict::fail(
            money(filing.credits.education),
            money(0.0),
            "married filing separately cannot claim education credits",
        ))
    } else {
        Ok(Verdict::pass(
            money(0.0),
            money(0.0),
            "no education credit applied for a separate return",
        ))
    }
}

fn nonrefundable_credit_excess(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if filing.credits.total <= 0.0 {
        return Ok(Verdict::skip("no credits applied"));
    }
    if filing.credits.total > filing.federal_income_tax {
        Ok(Verdict::warn(
            money(filing.credits.total),
            format!("<= {}", money(filing.federal_income_tax)),
            format!(
                "{} of credits exceeds income tax and is unused; refundable portions are not modeled",
                money(filing.credits.total - filing.federal_income_tax)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(filing.credits.total),
            format!("<= {}", money(filing.federal_income_tax)),
            "credits are fully absorbed by income tax",
        ))
    }
}
