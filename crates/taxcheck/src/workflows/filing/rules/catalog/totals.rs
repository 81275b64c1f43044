use super::super::super::brackets::{compute_tax, marginal_rate};
use super::super::super::domain::amount;
use super::super::registry::{Citation, RuleDescriptor, RuleKind, RuleStage, Severity};
use super::super::support::{
    compare_amounts, has_inputs, money, percent, DOLLAR, NOT_COMPUTED, NO_INPUTS,
};
use super::super::verdict::{EvaluationError, Verdict, VerdictStatus};
use super::super::RuleContext;
use super::{EARNED, FEDERAL, INVESTMENTS, NEC};

type Outcome = Result<Verdict, EvaluationError>;

const UNDERPAYMENT_SAFE_HARBOR: f64 = 1_000.0;

pub(super) fn rules() -> Vec<RuleDescriptor> {
    vec![
        RuleDescriptor {
            id: "total-income-composition",
            name: "Total income equals the sum of sources",
            citation: Citation::new("IRC §61", "Form 1040", "Line 9"),
            scenarios: FEDERAL,
            stage: RuleStage::Computation,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: total_income_composition,
        },
        RuleDescriptor {
            id: "taxable-income-derivation",
            name: "Taxable income derived from AGI and deductions",
            citation: Citation::new("IRC §63(a)", "Form 1040", "Line 15"),
            scenarios: FEDERAL,
            stage: RuleStage::Computation,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: taxable_income_derivation,
        },
        RuleDescriptor {
            id: "federal-tax-brackets",
            name: "Federal income tax follows bracket table",
            citation: Citation::new("IRC §1(j)", "Form 1040", "Line 16"),
            scenarios: FEDERAL,
            stage: RuleStage::Computation,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: federal_tax_brackets,
        },
        RuleDescriptor {
            id: "total-tax-composition",
            name: "Total tax equals income tax after credits plus SE tax",
            citation: Citation::new("IRC §1, §1401", "Form 1040", "Line 24"),
            scenarios: FEDERAL,
            stage: RuleStage::Computation,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: total_tax_composition,
        },
        RuleDescriptor {
            id: "net-result-balance",
            name: "Refund or amount owed balances payments and tax",
            citation: Citation::new("IRC §6401", "Form 1040", "Lines 34 and 37"),
            scenarios: FEDERAL,
            stage: RuleStage::Computation,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: net_result_balance,
        },
        RuleDescriptor {
            id: "underpayment-penalty-risk",
            name: "Estimated tax underpayment risk",
            citation: Citation::new("IRC §6654", "Form 2210", "Part I"),
            scenarios: FEDERAL,
            stage: RuleStage::Computation,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: underpayment_penalty_risk,
        },
        RuleDescriptor {
            id: "estimated-payments-self-employed",
            name: "Self-employed filer made estimated payments",
            citation: Citation::new("IRC §6654(d)", "Form 1040-ES", "Worksheet"),
            scenarios: NEC,
            stage: RuleStage::Computation,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: estimated_payments_self_employed,
        },
        RuleDescriptor {
            id: "additional-medicare-tax",
            name: "Additional Medicare tax exposure",
            citation: Citation::new("IRC §3101(b)(2)", "Form 8959", "Line 18"),
            scenarios: EARNED,
            stage: RuleStage::Computation,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: additional_medicare_tax,
        },
        RuleDescriptor {
            id: "net-investment-income-tax",
            name: "Net investment income tax exposure",
            citation: Citation::new("IRC §1411", "Form 8960", "Line 17"),
            scenarios: INVESTMENTS,
            stage: RuleStage::Computation,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: net_investment_income_tax,
        },
        RuleDescriptor {
            id: "preferential-rate-income",
            name: "Qualified dividends and long-term gains at preferential rates",
            citation: Citation::new("IRC §1(h)", "Form 1040", "Line 16 worksheet"),
            scenarios: INVESTMENTS,
            stage: RuleStage::Computation,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: preferential_rate_income,
        },
    ]
}

fn total_income_composition(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let income = &filing.income;
    let expected = income.wages
        + income.self_employment
        + income.interest
        + income.ordinary_dividends
        + income.capital_gains
        + income.other;
    Ok(compare_amounts(
        "Total income",
        income.total,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn taxable_income_derivation(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let expected = (filing.agi
        - filing.deduction
        - filing.home_office_deduction
        - filing.mileage_deduction)
        .max(0.0);
    Ok(compare_amounts(
        "Taxable income",
        filing.taxable_income,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn federal_tax_brackets(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    if ctx.federal.brackets.is_empty() {
        return Err(EvaluationError::MissingField("federal bracket table"));
    }
    let expected = compute_tax(filing.taxable_income, ctx.federal.brackets) as f64;
    Ok(compare_amounts(
        "Federal income tax",
        filing.federal_income_tax,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn total_tax_composition(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let expected = (filing.federal_income_tax - filing.credits.total).max(0.0) + filing.se_tax;
    Ok(compare_amounts(
        "Total tax",
        filing.total_tax,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn net_result_balance(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    Ok(compare_amounts(
        "Refund or balance due",
        filing.net_result,
        filing.total_withheld - filing.total_tax,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn underpayment_penalty_risk(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    let owed = (-filing.net_result).max(0.0);
    if owed > UNDERPAYMENT_SAFE_HARBOR {
        Ok(Verdict::warn(
            money(owed),
            format!("< {}", money(UNDERPAYMENT_SAFE_HARBOR)),
            "balance due exceeds $1,000; an underpayment penalty may apply unless a safe harbor is met",
        ))
    } else {
        Ok(Verdict::pass(
            money(owed),
            format!("< {}", money(UNDERPAYMENT_SAFE_HARBOR)),
            "balance due is under the estimated tax threshold",
        ))
    }
}

fn estimated_payments_self_employed(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if filing.income.self_employment <= 0.0 {
        return Ok(Verdict::skip("no self-employment income"));
    }
    let estimated = ctx.session.manual.estimated_payments;
    let owed = (-filing.net_result).max(0.0);
    if estimated <= 0.0 && owed > UNDERPAYMENT_SAFE_HARBOR {
        Ok(Verdict::warn(
            money(estimated),
            "quarterly payments",
            format!(
                "self-employment income with {} due and no estimated payments; quarterly payments are expected",
                money(owed)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(estimated),
            "quarterly payments",
            "estimated payments cover self-employment income",
        ))
    }
}

fn additional_medicare_tax(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let payroll = &ctx.constants().payroll;
    let medicare_wages = ctx
        .session
        .w2s()
        .map(|(_, form)| form.medicare_wages.unwrap_or(amount(form.wages)))
        .sum::<f64>();
    let earned = medicare_wages + filing.income.self_employment.max(0.0) * payroll.se_earnings_factor;
    if earned <= 0.0 {
        return Ok(Verdict::skip("no earned income"));
    }
    let threshold = payroll
        .additional_medicare_threshold
        .get(ctx.session.filing_status);
    if earned > threshold {
        let tax = ((earned - threshold) * payroll.additional_medicare_rate).round();
        Ok(Verdict::warn(
            money(earned),
            format!("<= {}", money(threshold)),
            format!(
                "earned income above {} owes about {} of additional Medicare tax, not included in total tax",
                money(threshold),
                money(tax)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(earned),
            format!("<= {}", money(threshold)),
            "earned income is below the additional Medicare tax threshold",
        ))
    }
}

fn net_investment_income_tax(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let income = &filing.income;
    let investment = income.interest + income.ordinary_dividends + income.capital_gains.max(0.0);
    if investment <= 0.0 {
        return Ok(Verdict::skip("no net investment income"));
    }
    let constants = ctx.constants();
    let threshold = constants.niit_threshold.get(ctx.session.filing_status);
    if filing.agi > threshold {
        let base = investment.min(filing.agi - threshold);
        Ok(Verdict::warn(
            money(filing.agi),
            format!("<= {}", money(threshold)),
            format!(
                "net investment income tax of about {} ({} of {}) applies and is not included in total tax",
                money((base * constants.niit_rate).round()),
                percent(constants.niit_rate),
                money(base)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(filing.agi),
            format!("<= {}", money(threshold)),
            "income is below the net investment income tax threshold",
        ))
    }
}

fn preferential_rate_income(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let long_term = ctx
        .session
        .brokerage_forms()
        .map(|(_, form)| amount(form.long_term_gain))
        .sum::<f64>()
        .max(0.0);
    let preferential = filing.income.qualified_dividends + long_term;
    if preferential <= 0.0 {
        return Ok(Verdict::skip("no qualified dividends or long-term gains"));
    }
    let marginal = marginal_rate(filing.taxable_income, ctx.federal.brackets);
    let preferential_rate = if marginal <= 0.12 { 0.0 } else { 0.15 };
    let savings = (preferential * (marginal - preferential_rate)).max(0.0).round();
    if savings < DOLLAR {
        return Ok(Verdict::pass(
            money(preferential),
            percent(preferential_rate),
            "preferential-rate income is taxed close to its ordinary rate",
        ));
    }
    Ok(Verdict::warn(
        money(preferential),
        percent(preferential_rate),
        format!(
            "{} is taxed at the {} ordinary rate here; capital gain rates could lower tax by about {}",
            money(preferential),
            percent(marginal),
            money(savings)
        ),
    ))
}
