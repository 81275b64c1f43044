use super::super::super::domain::{amount, FilingStatus};
use super::super::registry::{Citation, RuleDescriptor, RuleKind, RuleStage, Severity};
use super::super::support::{
    check_ceiling, compare_amounts, has_inputs, money, DOLLAR, NOT_COMPUTED, NO_INPUTS,
};
use super::super::verdict::{EvaluationError, Verdict, VerdictStatus};
use super::super::RuleContext;
use super::{FEDERAL, NEC, W2};

type Outcome = Result<Verdict, EvaluationError>;

/// Box 12 codes for elective deferrals subject to the §402(g) limit.
const ELECTIVE_DEFERRAL_CODES: &[&str] = &["D", "E", "F", "G", "S"];

pub(super) fn rules() -> Vec<RuleDescriptor> {
    vec![
        RuleDescriptor {
            id: "se-tax-amount",
            name: "Self-employment tax computed on net earnings",
            citation: Citation::new("IRC §1401", "Schedule SE", "Line 12"),
            scenarios: NEC,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: se_tax_amount,
        },
        RuleDescriptor {
            id: "se-deduction-half",
            name: "Deduction for half of self-employment tax",
            citation: Citation::new("IRC §164(f)", "Schedule 1", "Line 15"),
            scenarios: NEC,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: se_deduction_half,
        },
        RuleDescriptor {
            id: "se-minimum-earnings",
            name: "Self-employment tax threshold",
            citation: Citation::new("IRC §6017", "Schedule SE", "Line 4c"),
            scenarios: NEC,
            stage: RuleStage::Adjustments,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: se_minimum_earnings,
        },
        RuleDescriptor {
            id: "se-social-security-cap",
            name: "Self-employment social security capped with wages",
            citation: Citation::new("IRC §1402(b)(1)", "Schedule SE", "Line 8a"),
            scenarios: NEC,
            stage: RuleStage::Adjustments,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: se_social_security_cap,
        },
        RuleDescriptor {
            id: "ira-contribution-limit",
            name: "IRA contributions within limit",
            citation: Citation::new("IRC §219(b)(5)", "Schedule 1", "Line 20"),
            scenarios: FEDERAL,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: ira_contribution_limit,
        },
        RuleDescriptor {
            id: "hsa-contribution-limit",
            name: "HSA contributions within limit",
            citation: Citation::new("IRC §223(b)", "Form 8889", "Line 13"),
            scenarios: FEDERAL,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: hsa_contribution_limit,
        },
        RuleDescriptor {
            id: "elective-deferral-limit",
            name: "401(k) elective deferrals within limit",
            citation: Citation::new("IRC §402(g)", "Form W-2", "Box 12"),
            scenarios: W2,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: elective_deferral_limit,
        },
        RuleDescriptor {
            id: "student-loan-interest-cap",
            name: "Student loan interest deduction capped",
            citation: Citation::new("IRC §221(b)(1)", "Schedule 1", "Line 21"),
            scenarios: FEDERAL,
            stage: RuleStage::Adjustments,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: student_loan_interest_cap,
        },
        RuleDescriptor {
            id: "student-loan-phaseout",
            name: "Student loan interest income phase-out",
            citation: Citation::new("IRC §221(b)(2)", "Schedule 1", "Line 21"),
            scenarios: FEDERAL,
            stage: RuleStage::Adjustments,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: student_loan_phaseout,
        },
        RuleDescriptor {
            id: "educator-expense-cap",
            name: "Educator expense deduction",
            citation: Citation::new("IRC §62(a)(2)(D)", "Schedule 1", "Line 11"),
            scenarios: W2,
            stage: RuleStage::Adjustments,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: educator_expense_cap,
        },
        RuleDescriptor {
            id: "se-health-insurance-limit",
            name: "Self-employed health insurance limited to business profit",
            citation: Citation::new("IRC §162(l)(2)(A)", "Schedule 1", "Line 17"),
            scenarios: NEC,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: se_health_insurance_limit,
        },
        RuleDescriptor {
            id: "agi-within-total-income",
            name: "Adjustments do not exceed total income",
            citation: Citation::new("IRC §62", "Form 1040", "Line 11"),
            scenarios: FEDERAL,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: agi_within_total_income,
        },
        RuleDescriptor {
            id: "adjustment-inputs-nonnegative",
            name: "Adjustment inputs are non-negative",
            citation: Citation::new("IRC §62", "Schedule 1", "Part II"),
            scenarios: FEDERAL,
            stage: RuleStage::Adjustments,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: adjustment_inputs_nonnegative,
        },
    ]
}

fn se_tax_amount(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if filing.income.self_employment <= 0.0 {
        return Ok(Verdict::skip("no self-employment income"));
    }
    let payroll = &ctx.constants().payroll;
    let expected =
        (filing.income.self_employment * payroll.se_earnings_factor * payroll.se_tax_rate).round();
    Ok(compare_amounts(
        "Self-employment tax",
        filing.se_tax,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn se_deduction_half(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if filing.se_tax <= 0.0 {
        return Ok(Verdict::skip("no self-employment tax"));
    }
    Ok(compare_amounts(
        "Deductible half of SE tax",
        filing.adjustments.se_deduction,
        (filing.se_tax * 0.5).floor(),
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn se_minimum_earnings(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if filing.income.self_employment <= 0.0 {
        return Ok(Verdict::skip("no self-employment income"));
    }
    let payroll = &ctx.constants().payroll;
    let net_earnings = filing.income.self_employment * payroll.se_earnings_factor;
    if net_earnings < payroll.se_minimum_earnings {
        Ok(Verdict::warn(
            money(net_earnings),
            format!(">= {}", money(payroll.se_minimum_earnings)),
            format!(
                "net earnings below {} owe no SE tax; {} is included here",
                money(payroll.se_minimum_earnings),
                money(filing.se_tax)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(net_earnings),
            format!(">= {}", money(payroll.se_minimum_earnings)),
            "net earnings meet the self-employment tax threshold",
        ))
    }
}

fn se_social_security_cap(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if filing.income.self_employment <= 0.0 {
        return Ok(Verdict::skip("no self-employment income"));
    }
    let payroll = &ctx.constants().payroll;
    let ss_wages = ctx
        .session
        .w2s()
        .map(|(_, form)| amount(form.social_security_wages))
        .sum::<f64>();
    let net_earnings = filing.income.self_employment * payroll.se_earnings_factor;
    let combined = ss_wages + net_earnings;
    if combined > payroll.social_security_wage_base {
        let uncapped = (combined - payroll.social_security_wage_base).min(net_earnings);
        Ok(Verdict::warn(
            money(combined),
            format!("<= {}", money(payroll.social_security_wage_base)),
            format!(
                "{} of net earnings is above the social security wage base; SE tax is overstated by about {}",
                money(uncapped),
                money(uncapped * payroll.social_security_rate * 2.0)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(combined),
            format!("<= {}", money(payroll.social_security_wage_base)),
            "wages plus net earnings stay within the social security wage base",
        ))
    }
}

fn ira_contribution_limit(ctx: &RuleContext<'_>) -> Outcome {
    let contributed = ctx.session.manual.retirement_contributions;
    if contributed <= 0.0 {
        return Ok(Verdict::skip("no IRA contributions entered"));
    }
    Ok(check_ceiling(
        "IRA contributions",
        contributed,
        ctx.constants().limits.ira,
        VerdictStatus::Fail,
    ))
}

fn hsa_contribution_limit(ctx: &RuleContext<'_>) -> Outcome {
    let employer = ctx
        .session
        .w2s()
        .map(|(_, form)| form.box12_total(&["W"]))
        .sum::<f64>();
    let manual = &ctx.session.manual;
    let contributed = manual.hsa_contributions + employer;
    if contributed <= 0.0 {
        return Ok(Verdict::skip("no HSA contributions on file"));
    }
    let limit = ctx.constants().limits.hsa(manual.hsa_family_coverage);
    Ok(check_ceiling(
        "HSA contributions including employer box 12 code W",
        contributed,
        limit,
        VerdictStatus::Fail,
    ))
}

fn elective_deferral_limit(ctx: &RuleContext<'_>) -> Outcome {
    let deferred = ctx
        .session
        .w2s()
        .map(|(_, form)| form.box12_total(ELECTIVE_DEFERRAL_CODES))
        .sum::<f64>();
    if deferred <= 0.0 {
        return Ok(Verdict::skip("no elective deferrals reported in box 12"));
    }
    Ok(check_ceiling(
        "Elective deferrals across employers",
        deferred,
        ctx.constants().limits.elective_deferral,
        VerdictStatus::Fail,
    ))
}

fn student_loan_interest_paid(ctx: &RuleContext<'_>) -> f64 {
    ctx.session.manual.student_loan_interest
        + ctx
            .session
            .student_loan_forms()
            .map(|(_, form)| amount(form.student_loan_interest))
            .sum::<f64>()
}

fn student_loan_interest_cap(ctx: &RuleContext<'_>) -> Outcome {
    let paid = student_loan_interest_paid(ctx);
    if paid <= 0.0 {
        return Ok(Verdict::skip("no student loan interest on file"));
    }
    let cap = ctx.constants().limits.student_loan_interest;
    if paid > cap {
        Ok(Verdict::warn(
            money(paid),
            format!("<= {}", money(cap)),
            format!("only {} of {} interest paid is deductible", money(cap), money(paid)),
        ))
    } else {
        Ok(Verdict::pass(
            money(paid),
            format!("<= {}", money(cap)),
            "student loan interest is within the deduction cap",
        ))
    }
}

fn student_loan_phaseout(ctx: &RuleContext<'_>) -> Outcome {
    if student_loan_interest_paid(ctx) <= 0.0 {
        return Ok(Verdict::skip("no student loan interest on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let status = ctx.session.filing_status;
    if status == FilingStatus::MarriedFilingSeparately {
        return Ok(Verdict::fail(
            money(filing.adjustments.student_loan_interest),
            money(0.0),
            "married filing separately cannot deduct student loan interest",
        ));
    }
    let (start, end) = ctx.constants().student_loan_phaseout.get(status);
    let range = format!("{} - {}", money(start), money(end));
    if filing.agi >= end {
        Ok(Verdict::warn(
            money(filing.agi),
            range,
            "income is above the phase-out range; the deduction is fully disallowed",
        ))
    } else if filing.agi > start {
        let share = (filing.agi - start) / (end - start);
        Ok(Verdict::warn(
            money(filing.agi),
            range,
            format!(
                "income is inside the phase-out range; about {:.0}% of the deduction is disallowed",
                share * 100.0
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(filing.agi),
            range,
            "income is below the phase-out range",
        ))
    }
}

fn educator_expense_cap(ctx: &RuleContext<'_>) -> Outcome {
    let manual = &ctx.session.manual;
    if manual.educator_expenses <= 0.0 {
        return Ok(Verdict::skip("no educator expenses entered"));
    }
    let cap = ctx.constants().limits.educator_expense;
    if !manual.is_educator {
        return Ok(Verdict::warn(
            money(manual.educator_expenses),
            money(0.0),
            "educator expenses were entered but the filer is not marked as an eligible educator",
        ));
    }
    if manual.educator_expenses > cap {
        Ok(Verdict::warn(
            money(manual.educator_expenses),
            format!("<= {}", money(cap)),
            format!("only {} of educator expenses is deductible", money(cap)),
        ))
    } else {
        Ok(Verdict::pass(
            money(manual.educator_expenses),
            format!("<= {}", money(cap)),
            "educator expenses are within the deduction cap",
        ))
    }
}

fn se_health_insurance_limit(ctx: &RuleContext<'_>) -> Outcome {
    let premiums = ctx.session.manual.se_health_insurance;
    if premiums <= 0.0 {
        return Ok(Verdict::skip("no self-employed health insurance entered"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let profit = (filing.income.self_employment - filing.adjustments.se_deduction).max(0.0);
    Ok(check_ceiling(
        "Self-employed health insurance",
        premiums,
        profit,
        VerdictStatus::Fail,
    ))
}

fn agi_within_total_income(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    if filing.adjustments.total <= filing.income.total.max(0.0) + 0.005 {
        Ok(Verdict::pass(
            money(filing.agi),
            ">= $0",
            "adjustments are covered by total income",
        ))
    } else {
        Ok(Verdict::fail(
            money(filing.agi),
            ">= $0",
            format!(
                "adjustments of {} exceed total income of {}",
                money(filing.adjustments.total),
                money(filing.income.total)
            ),
        ))
    }
}

fn adjustment_inputs_nonnegative(ctx: &RuleContext<'_>) -> Outcome {
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let manual = &ctx.session.manual;
    let inputs = [
        ("retirement_contributions", manual.retirement_contributions),
        ("hsa_contributions", manual.hsa_contributions),
        ("student_loan_interest", manual.student_loan_interest),
        ("se_health_insurance", manual.se_health_insurance),
        ("educator_expenses", manual.educator_expenses),
        ("mortgage_interest", manual.mortgage_interest),
        ("state_local_taxes_paid", manual.state_local_taxes_paid),
        ("charitable_contributions", manual.charitable_contributions),
        ("medical_expenses", manual.medical_expenses),
        ("home_office_sqft", manual.home_office_sqft),
        ("business_miles", manual.business_miles),
        ("childcare_expenses", manual.childcare_expenses),
        ("education_expenses", manual.education_expenses),
        ("estimated_payments", manual.estimated_payments),
        ("state_estimated_payments", manual.state_estimated_payments),
    ];
    if let Some((field, value)) = inputs.iter().find(|(_, value)| value.is_nan()) {
        return Err(EvaluationError::InvalidValue {
            field: *field,
            reason: format!("{value} is not a number"),
        });
    }
    let negative = inputs
        .iter()
        .filter(|(_, value)| *value < 0.0)
        .map(|(field, _)| *field)
        .collect::<Vec<_>>();
    if negative.is_empty() {
        Ok(Verdict::pass(
            "all >= 0",
            "all >= 0",
            "every entered adjustment and deduction amount is non-negative",
        ))
    } else {
        Ok(Verdict::fail(
            format!("{} negative", negative.len()),
            "all >= 0",
            format!("negative amounts entered for: {}", negative.join(", ")),
        ))
    }
}
