use super::super::super::computation::{itemized_breakdown, state_local_taxes_paid};
use super::super::super::domain::{DeductionChoice, DocumentType, FilingStatus};
use super::super::registry::{Citation, RuleDescriptor, RuleKind, RuleStage, Severity};
use super::super::support::{
    compare_amounts, has_inputs, money, percent, DOLLAR, NOT_COMPUTED, NO_INPUTS,
};
use super::super::verdict::{EvaluationError, Verdict, VerdictStatus};
use super::super::RuleContext;
use super::{FEDERAL, NEC};

type Outcome = Result<Verdict, EvaluationError>;

const MEDICAL_AGI_FLOOR: f64 = 0.075;
const CHARITABLE_RECEIPT_THRESHOLD: f64 = 250.0;

pub(super) fn rules() -> Vec<RuleDescriptor> {
    vec![
        RuleDescriptor {
            id: "standard-deduction-amount",
            name: "Standard deduction matches filing status",
            citation: Citation::new("IRC §63(c)", "Form 1040", "Line 12"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: standard_deduction_amount,
        },
        RuleDescriptor {
            id: "head-of-household-dependents",
            name: "Head of household has a qualifying person",
            citation: Citation::new("IRC §2(b)", "Form 1040", "Filing Status"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: head_of_household_dependents,
        },
        RuleDescriptor {
            id: "salt-cap",
            name: "State and local tax deduction capped",
            citation: Citation::new("IRC §164(b)(6)", "Schedule A", "Line 5e"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: salt_cap,
        },
        RuleDescriptor {
            id: "itemize-or-standard",
            name: "Larger of standard or itemized deduction",
            citation: Citation::new("IRC §63(e)", "Schedule A", "Line 17"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Warning,
            kind: RuleKind::Savings,
            check: itemize_or_standard,
        },
        RuleDescriptor {
            id: "mortgage-interest-double-count",
            name: "Mortgage interest entered once",
            citation: Citation::new("IRC §163(h)(3)", "Schedule A", "Line 8a"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: mortgage_interest_double_count,
        },
        RuleDescriptor {
            id: "charitable-substantiation",
            name: "Charitable contributions substantiated",
            citation: Citation::new("IRC §170(f)(8)", "Schedule A", "Line 11"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: charitable_substantiation,
        },
        RuleDescriptor {
            id: "medical-agi-floor",
            name: "Medical expenses above 7.5% of AGI",
            citation: Citation::new("IRC §213(a)", "Schedule A", "Line 4"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: medical_agi_floor,
        },
        RuleDescriptor {
            id: "home-office-area",
            name: "Simplified home office area limit",
            citation: Citation::new("Rev. Proc. 2013-13", "Form 8829", "Simplified method"),
            scenarios: NEC,
            stage: RuleStage::Deductions,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: home_office_area,
        },
        RuleDescriptor {
            id: "home-office-requires-business",
            name: "Home office requires self-employment income",
            citation: Citation::new("IRC §280A(c)(1)", "Schedule C", "Line 30"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: home_office_requires_business,
        },
        RuleDescriptor {
            id: "mileage-requires-business",
            name: "Business mileage requires self-employment income",
            citation: Citation::new("IRC §162(a)", "Schedule C", "Line 9"),
            scenarios: FEDERAL,
            stage: RuleStage::Deductions,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: mileage_requires_business,
        },
    ]
}

fn standard_deduction_amount(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let expected = ctx.constants().standard_deduction.get(ctx.session.filing_status);
    let mut verdict = compare_amounts(
        "Standard deduction",
        filing.standard_deduction,
        expected,
        0.0,
        VerdictStatus::Fail,
    );
    if filing.deduction_choice == DeductionChoice::Standard
        && verdict.status == VerdictStatus::Pass
        && (filing.deduction - expected).abs() > 0.005
    {
        verdict = Verdict::fail(
            money(filing.deduction),
            money(expected),
            "standard deduction was chosen but a different amount was applied",
        );
    }
    Ok(verdict)
}

fn head_of_household_dependents(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    if session.filing_status != FilingStatus::HeadOfHousehold {
        return Ok(Verdict::skip("filing status is not head of household"));
    }
    let dependents = &session.dependents;
    let count = u32::from(dependents.children_under_17) + u32::from(dependents.other_dependents);
    if count == 0 {
        Ok(Verdict::fail(
            "0 dependents",
            ">= 1 dependent",
            "head of household requires a qualifying person; no dependents are listed",
        ))
    } else {
        Ok(Verdict::pass(
            format!("{count} dependents"),
            ">= 1 dependent",
            "a qualifying person is listed",
        ))
    }
}

fn salt_cap(ctx: &RuleContext<'_>) -> Outcome {
    let paid = state_local_taxes_paid(ctx.session);
    if paid <= 0.0 {
        return Ok(Verdict::skip("no state or local taxes paid on file"));
    }
    let cap = ctx.constants().salt_cap.get(ctx.session.filing_status);
    let applied = ctx
        .filing
        .map(|filing| filing.itemized.state_local_taxes)
        .unwrap_or_else(|| paid.min(cap));
    if applied > cap + 0.005 {
        return Ok(Verdict::fail(
            money(applied),
            format!("<= {}", money(cap)),
            "state and local taxes were applied above the cap",
        ));
    }
    if paid > cap {
        Ok(Verdict::warn(
            money(applied),
            format!("<= {}", money(cap)),
            format!(
                "{} of the {} paid is not deductible because of the SALT cap",
                money(paid - cap),
                money(paid)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(applied),
            format!("<= {}", money(cap)),
            "state and local taxes are within the cap",
        ))
    }
}

fn itemize_or_standard(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let itemized = filing.itemized.total;
    let standard = filing.standard_deduction;
    if itemized <= 0.0 && filing.deduction_choice == DeductionChoice::Standard {
        return Ok(Verdict::skip("no itemizable expenses on file"));
    }
    let best = itemized.max(standard);
    if filing.deduction + DOLLAR < best {
        let (better, amount) = if itemized > standard {
            ("itemizing", itemized)
        } else {
            ("the standard deduction", standard)
        };
        Ok(Verdict::warn(
            money(filing.deduction),
            money(best),
            format!(
                "{better} would deduct {} more ({} total)",
                money(amount - filing.deduction),
                money(amount)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(filing.deduction),
            money(best),
            "the larger of the standard and itemized deduction is applied",
        ))
    }
}

fn mortgage_interest_double_count(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    let has_1098 = session.has_document(DocumentType::Form1098);
    let manual = session.manual.mortgage_interest;
    if !has_1098 || manual <= 0.0 {
        return Ok(Verdict::skip("mortgage interest comes from a single source"));
    }
    let reported = itemized_breakdown(session, ctx.constants()).mortgage_interest;
    Ok(Verdict::warn(
        money(reported),
        money(reported - manual),
        format!(
            "{} of manually entered mortgage interest is added to the 1098 amount; confirm it is not the same loan",
            money(manual)
        ),
    ))
}

fn charitable_substantiation(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    let given = session.manual.charitable_contributions;
    if given <= 0.0 || session.deduction_choice != DeductionChoice::Itemized {
        return Ok(Verdict::skip("no itemized charitable contributions"));
    }
    if given >= CHARITABLE_RECEIPT_THRESHOLD {
        Ok(Verdict::warn(
            money(given),
            "acknowledgment on file",
            format!(
                "gifts of {} or more need a written acknowledgment from the charity",
                money(CHARITABLE_RECEIPT_THRESHOLD)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(given),
            format!("< {}", money(CHARITABLE_RECEIPT_THRESHOLD)),
            "contributions are below the written acknowledgment threshold",
        ))
    }
}

fn medical_agi_floor(ctx: &RuleContext<'_>) -> Outcome {
    let medical = ctx.session.manual.medical_expenses;
    if medical <= 0.0 || ctx.session.deduction_choice != DeductionChoice::Itemized {
        return Ok(Verdict::skip("no itemized medical expenses"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let floor = (filing.agi * MEDICAL_AGI_FLOOR).max(0.0);
    let deductible = (medical - floor).max(0.0);
    Ok(Verdict::warn(
        money(filing.itemized.medical),
        money(deductible),
        format!(
            "only medical expenses above {} of AGI ({}) are deductible; the estimate includes the full {}",
            percent(MEDICAL_AGI_FLOOR),
            money(floor),
            money(medical)
        ),
    ))
}

fn home_office_area(ctx: &RuleContext<'_>) -> Outcome {
    let sqft = ctx.session.manual.home_office_sqft;
    if sqft <= 0.0 {
        return Ok(Verdict::skip("no home office entered"));
    }
    let max = ctx.constants().home_office_max_sqft;
    if sqft > max {
        Ok(Verdict::warn(
            format!("{sqft:.0} sq ft"),
            format!("<= {max:.0} sq ft"),
            format!(
                "the simplified method stops at {max:.0} sq ft; the regular method may deduct more"
            ),
        ))
    } else {
        Ok(Verdict::pass(
            format!("{sqft:.0} sq ft"),
            format!("<= {max:.0} sq ft"),
            "home office area is within the simplified method limit",
        ))
    }
}

fn business_use_verdict(ctx: &RuleContext<'_>, what: &str, claimed: bool) -> Outcome {
    if !claimed {
        return Ok(Verdict::skip(format!("no {what} entered")));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if filing.income.self_employment > 0.0 {
        Ok(Verdict::pass(
            money(filing.income.self_employment),
            "> $0",
            format!("{what} is backed by self-employment income"),
        ))
    } else {
        Ok(Verdict::fail(
            money(0.0),
            "> $0",
            format!("{what} was deducted without any self-employment income"),
        ))
    }
}

fn home_office_requires_business(ctx: &RuleContext<'_>) -> Outcome {
    business_use_verdict(
        ctx,
        "home office deduction",
        ctx.session.manual.home_office_sqft > 0.0,
    )
}

fn mileage_requires_business(ctx: &RuleContext<'_>) -> Outcome {
    business_use_verdict(
        ctx,
        "business mileage",
        ctx.session.manual.business_miles > 0.0,
    )
}
