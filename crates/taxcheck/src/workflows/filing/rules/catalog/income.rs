use std::collections::BTreeMap;

use super::super::super::domain::{amount, DocumentType};
use super::super::registry::{Citation, RuleDescriptor, RuleKind, RuleStage, Severity};
use super::super::support::{
    check_ceiling, compare_amounts, money, tolerance_for, DOLLAR, NOT_COMPUTED,
};
use super::super::verdict::{EvaluationError, Verdict, VerdictStatus};
use super::super::RuleContext;
use super::{FEDERAL, INVESTMENTS, NEC, W2};

type Outcome = Result<Verdict, EvaluationError>;

pub(super) fn rules() -> Vec<RuleDescriptor> {
    vec![
        RuleDescriptor {
            id: "w2-wages-total",
            name: "W-2 wages match reported wages",
            citation: Citation::new("IRC §61(a)(1)", "Form 1040", "Line 1a"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: w2_wages_total,
        },
        RuleDescriptor {
            id: "federal-withholding-total",
            name: "Federal withholding matches documents",
            citation: Citation::new("IRC §31", "Form 1040", "Line 25d"),
            scenarios: FEDERAL,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: federal_withholding_total,
        },
        RuleDescriptor {
            id: "w2-social-security-wage-base",
            name: "Social security wages within wage base",
            citation: Citation::new("IRC §3121(a)(1)", "Form W-2", "Box 3"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: w2_social_security_wage_base,
        },
        RuleDescriptor {
            id: "w2-social-security-tax-rate",
            name: "Social security tax withheld at 6.2%",
            citation: Citation::new("IRC §3101(a)", "Form W-2", "Box 4"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: w2_social_security_tax_rate,
        },
        RuleDescriptor {
            id: "w2-medicare-tax-rate",
            name: "Medicare tax withheld at 1.45%",
            citation: Citation::new("IRC §3101(b)", "Form W-2", "Box 6"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: w2_medicare_tax_rate,
        },
        RuleDescriptor {
            id: "w2-excess-social-security",
            name: "Excess social security withholding across employers",
            citation: Citation::new("IRC §31(b)", "Schedule 3", "Line 11"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: w2_excess_social_security,
        },
        RuleDescriptor {
            id: "w2-medicare-wages-floor",
            name: "Medicare wages cover box 1 wages",
            citation: Citation::new("IRC §3121(a)", "Form W-2", "Box 5"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: w2_medicare_wages_floor,
        },
        RuleDescriptor {
            id: "w2-employer-ein",
            name: "Employer EIN is well formed",
            citation: Citation::new("IRC §6109", "Form W-2", "Box b"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: w2_employer_ein,
        },
        RuleDescriptor {
            id: "w2-extraction-complete",
            name: "W-2 fields fully extracted",
            citation: Citation::new("IRC §6051", "Form W-2", "All boxes"),
            scenarios: W2,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: w2_extraction_complete,
        },
        RuleDescriptor {
            id: "nec-compensation-total",
            name: "1099-NEC compensation matches self-employment income",
            citation: Citation::new("IRC §1402(a)", "Schedule C", "Line 1"),
            scenarios: NEC,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: nec_compensation_total,
        },
        RuleDescriptor {
            id: "nec-extraction-complete",
            name: "1099-NEC fields fully extracted",
            citation: Citation::new("IRC §6041A", "Form 1099-NEC", "Box 1"),
            scenarios: NEC,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: nec_extraction_complete,
        },
        RuleDescriptor {
            id: "interest-income-total",
            name: "1099-INT interest matches reported interest",
            citation: Citation::new("IRC §61(a)(4)", "Form 1040", "Line 2b"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: interest_income_total,
        },
        RuleDescriptor {
            id: "interest-schedule-b",
            name: "Schedule B required for interest",
            citation: Citation::new("Treas. Reg. §1.6012-1", "Schedule B", "Part I"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: interest_schedule_b,
        },
        RuleDescriptor {
            id: "dividend-income-total",
            name: "1099-DIV dividends match reported dividends",
            citation: Citation::new("IRC §61(a)(7)", "Form 1040", "Line 3b"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: dividend_income_total,
        },
        RuleDescriptor {
            id: "qualified-dividends-within-ordinary",
            name: "Qualified dividends do not exceed ordinary dividends",
            citation: Citation::new("IRC §1(h)(11)", "Form 1099-DIV", "Box 1b"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Critical,
            kind: RuleKind::Compliance,
            check: qualified_dividends_within_ordinary,
        },
        RuleDescriptor {
            id: "dividend-schedule-b",
            name: "Schedule B required for dividends",
            citation: Citation::new("Treas. Reg. §1.6012-1", "Schedule B", "Part II"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: dividend_schedule_b,
        },
        RuleDescriptor {
            id: "brokerage-gain-consistency",
            name: "1099-B gain equals proceeds less basis",
            citation: Citation::new("IRC §1001(a)", "Form 8949", "Column (h)"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: brokerage_gain_consistency,
        },
        RuleDescriptor {
            id: "brokerage-term-split",
            name: "Short and long term gains sum to net gain",
            citation: Citation::new("IRC §1222", "Schedule D", "Lines 7 and 15"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Info,
            kind: RuleKind::Compliance,
            check: brokerage_term_split,
        },
        RuleDescriptor {
            id: "capital-loss-limit",
            name: "Net capital loss within annual limit",
            citation: Citation::new("IRC §1211(b)", "Schedule D", "Line 21"),
            scenarios: INVESTMENTS,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: capital_loss_limit,
        },
        RuleDescriptor {
            id: "duplicate-documents",
            name: "No document recorded twice",
            citation: Citation::new("IRC §6001", "Form 1040", "Income lines"),
            scenarios: FEDERAL,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: duplicate_documents,
        },
        RuleDescriptor {
            id: "unrecognized-documents",
            name: "All documents recognized",
            citation: Citation::new("IRC §6001", "Form 1040", "Income lines"),
            scenarios: FEDERAL,
            stage: RuleStage::IncomeReporting,
            severity: Severity::Warning,
            kind: RuleKind::Compliance,
            check: unrecognized_documents,
        },
    ]
}

fn w2_wages_total(ctx: &RuleContext<'_>) -> Outcome {
    let forms = ctx.session.w2s().collect::<Vec<_>>();
    if forms.is_empty() {
        return Ok(Verdict::skip("no W-2 on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let expected = forms.iter().map(|(_, form)| amount(form.wages)).sum::<f64>();
    let extracted = forms.iter().all(|(record, _)| record.fields_extracted(&["wages"]));
    Ok(compare_amounts(
        "Reported wages",
        filing.income.wages,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    )
    .extracted(extracted))
}

fn federal_withholding_total(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    if session.incomes.is_empty() && session.manual.estimated_payments <= 0.0 {
        return Ok(Verdict::skip("no documents or estimated payments on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let expected = session
        .incomes
        .iter()
        .map(|record| record.document.federal_withholding())
        .sum::<f64>()
        + session.manual.estimated_payments;
    Ok(compare_amounts(
        "Total federal payments",
        filing.total_withheld,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn w2_social_security_wage_base(ctx: &RuleContext<'_>) -> Outcome {
    let wage_base = ctx.constants().payroll.social_security_wage_base;
    let reported = ctx
        .session
        .w2s()
        .filter_map(|(_, form)| {
            form.social_security_wages
                .map(|wages| (form.employer_name.as_deref().unwrap_or("employer"), wages))
        })
        .collect::<Vec<_>>();
    if reported.is_empty() {
        return Ok(Verdict::skip("no W-2 reports social security wages"));
    }
    let highest = reported
        .iter()
        .map(|(_, wages)| *wages)
        .fold(f64::MIN, f64::max);
    let over = reported
        .iter()
        .filter(|(_, wages)| *wages > wage_base)
        .map(|(employer, _)| *employer)
        .collect::<Vec<_>>();
    if over.is_empty() {
        Ok(Verdict::pass(
            money(highest),
            format!("<= {}", money(wage_base)),
            "every W-2 reports social security wages within the wage base",
        ))
    } else {
        Ok(Verdict::fail(
            money(highest),
            format!("<= {}", money(wage_base)),
            format!(
                "social security wages exceed the {} wage base on: {}",
                money(wage_base),
                over.join(", ")
            ),
        ))
    }
}

fn w2_social_security_tax_rate(ctx: &RuleContext<'_>) -> Outcome {
    let payroll = &ctx.constants().payroll;
    let mut checked = 0;
    let mut current_total = 0.0;
    let mut expected_total = 0.0;
    let mut off = Vec::new();
    for (_, form) in ctx.session.w2s() {
        let (Some(wages), Some(withheld)) =
            (form.social_security_wages, form.social_security_tax_withheld)
        else {
            continue;
        };
        let expected = wages.min(payroll.social_security_wage_base) * payroll.social_security_rate;
        checked += 1;
        current_total += withheld;
        expected_total += expected;
        if (withheld - expected).abs() > tolerance_for(expected, 0.005) {
            off.push(form.employer_name.as_deref().unwrap_or("employer").to_string());
        }
    }
    if checked == 0 {
        return Ok(Verdict::skip("no W-2 reports both social security wages and tax"));
    }
    if off.is_empty() {
        Ok(Verdict::pass(
            money(current_total),
            money(expected_total),
            "social security tax withheld at 6.2% of social security wages",
        ))
    } else {
        Ok(Verdict::warn(
            money(current_total),
            money(expected_total),
            format!("social security tax does not match 6.2% of wages on: {}", off.join(", ")),
        ))
    }
}

fn w2_medicare_tax_rate(ctx: &RuleContext<'_>) -> Outcome {
    let payroll = &ctx.constants().payroll;
    // Employers withhold additional Medicare on wages above $200,000 regardless of status.
    const EMPLOYER_ADDITIONAL_THRESHOLD: f64 = 200_000.0;
    let mut checked = 0;
    let mut current_total = 0.0;
    let mut expected_total = 0.0;
    let mut off = Vec::new();
    for (_, form) in ctx.session.w2s() {
        let (Some(wages), Some(withheld)) = (form.medicare_wages, form.medicare_tax_withheld) else {
            continue;
        };
        let expected = wages * payroll.medicare_rate
            + (wages - EMPLOYER_ADDITIONAL_THRESHOLD).max(0.0) * payroll.additional_medicare_rate;
        checked += 1;
        current_total += withheld;
        expected_total += expected;
        if (withheld - expected).abs() > tolerance_for(expected, 0.005) {
            off.push(form.employer_name.as_deref().unwrap_or("employer").to_string());
        }
    }
    if checked == 0 {
        return Ok(Verdict::skip("no W-2 reports both Medicare wages and tax"));
    }
    if off.is_empty() {
        Ok(Verdict::pass(
            money(current_total),
            money(expected_total),
            "Medicare tax withheld at the statutory rate",
        ))
    } else {
        Ok(Verdict::warn(
            money(current_total),
            money(expected_total),
            format!("Medicare tax does not match the statutory rate on: {}", off.join(", ")),
        ))
    }
}

fn w2_excess_social_security(ctx: &RuleContext<'_>) -> Outcome {
    let payroll = &ctx.constants().payroll;
    let forms = ctx.session.w2s().collect::<Vec<_>>();
    if forms.len() < 2 {
        return Ok(Verdict::skip("fewer than two W-2s on file"));
    }
    let withheld = forms
        .iter()
        .map(|(_, form)| amount(form.social_security_tax_withheld))
        .sum::<f64>();
    let maximum = payroll.social_security_wage_base * payroll.social_security_rate;
    if withheld > maximum + DOLLAR {
        Ok(Verdict::warn(
            money(withheld),
            format!("<= {}", money(maximum)),
            format!(
                "{} of social security tax was over-withheld across employers and can be claimed as a credit",
                money(withheld - maximum)
            ),
        ))
    } else {
        Ok(Verdict::pass(
            money(withheld),
            format!("<= {}", money(maximum)),
            "combined social security withholding is within the annual maximum",
        ))
    }
}

fn w2_medicare_wages_floor(ctx: &RuleContext<'_>) -> Outcome {
    let mut checked = 0;
    let mut short = Vec::new();
    for (_, form) in ctx.session.w2s() {
        let (Some(wages), Some(medicare)) = (form.wages, form.medicare_wages) else {
            continue;
        };
        checked += 1;
        if medicare + DOLLAR < wages {
            short.push(form.employer_name.as_deref().unwrap_or("employer").to_string());
        }
    }
    if checked == 0 {
        return Ok(Verdict::skip("no W-2 reports both wages and Medicare wages"));
    }
    if short.is_empty() {
        Ok(Verdict::pass(
            "box 5 >= box 1",
            "box 5 >= box 1",
            "Medicare wages cover taxable wages on every W-2",
        ))
    } else {
        Ok(Verdict::warn(
            "box 5 < box 1",
            "box 5 >= box 1",
            format!(
                "Medicare wages are below box 1 wages on: {}; check for a misread box",
                short.join(", ")
            ),
        ))
    }
}

fn w2_employer_ein(ctx: &RuleContext<'_>) -> Outcome {
    let eins = ctx
        .session
        .w2s()
        .filter_map(|(_, form)| form.employer_ein.as_deref())
        .collect::<Vec<_>>();
    if eins.is_empty() {
        return Ok(Verdict::skip("no employer EIN extracted"));
    }
    let malformed = eins
        .iter()
        .filter(|ein| {
            let digits = ein.chars().filter(char::is_ascii_digit).count();
            let other = ein.chars().filter(|c| !c.is_ascii_digit() && *c != '-').count();
            digits != 9 || other > 0
        })
        .copied()
        .collect::<Vec<_>>();
    if malformed.is_empty() {
        Ok(Verdict::pass(
            eins.join(", "),
            "NN-NNNNNNN",
            "every employer EIN has nine digits",
        ))
    } else {
        Ok(Verdict::warn(
            malformed.join(", "),
            "NN-NNNNNNN",
            "employer EIN is not nine digits; re-check the extracted value",
        ))
    }
}

fn extraction_gaps(ctx: &RuleContext<'_>, doc_type: DocumentType) -> Option<Vec<String>> {
    let records = ctx
        .session
        .incomes
        .iter()
        .filter(|record| record.doc_type() == doc_type)
        .collect::<Vec<_>>();
    if records.is_empty() {
        return None;
    }
    Some(
        records
            .iter()
            .flat_map(|record| {
                record
                    .missing_fields()
                    .into_iter()
                    .map(move |field| format!("{}:{field}", record.document_id.0))
            })
            .collect(),
    )
}

fn extraction_verdict(doc_type: DocumentType, gaps: Vec<String>) -> Verdict {
    if gaps.is_empty() {
        Verdict::pass(
            "all fields read",
            "all fields read",
            format!("every {} field was extracted", doc_type.label()),
        )
    } else {
        Verdict::warn(
            format!("{} missing", gaps.len()),
            "0 missing",
            format!("fields not found on {}: {}", doc_type.label(), gaps.join(", ")),
        )
        .extracted(false)
    }
}

fn w2_extraction_complete(ctx: &RuleContext<'_>) -> Outcome {
    match extraction_gaps(ctx, DocumentType::W2) {
        None => Ok(Verdict::skip("no W-2 on file")),
        Some(gaps) => Ok(extraction_verdict(DocumentType::W2, gaps)),
    }
}

fn nec_extraction_complete(ctx: &RuleContext<'_>) -> Outcome {
    match extraction_gaps(ctx, DocumentType::Form1099Nec) {
        None => Ok(Verdict::skip("no 1099-NEC on file")),
        Some(gaps) => Ok(extraction_verdict(DocumentType::Form1099Nec, gaps)),
    }
}

fn nec_compensation_total(ctx: &RuleContext<'_>) -> Outcome {
    let forms = ctx.session.necs().collect::<Vec<_>>();
    if forms.is_empty() {
        return Ok(Verdict::skip("no 1099-NEC on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let expected = forms
        .iter()
        .map(|(_, form)| amount(form.nonemployee_compensation))
        .sum::<f64>();
    let extracted = forms
        .iter()
        .all(|(record, _)| record.fields_extracted(&["nonemployee_compensation"]));
    Ok(compare_amounts(
        "Self-employment income",
        filing.income.self_employment,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    )
    .extracted(extracted))
}

fn interest_income_total(ctx: &RuleContext<'_>) -> Outcome {
    let forms = ctx.session.interest_forms().collect::<Vec<_>>();
    if forms.is_empty() {
        return Ok(Verdict::skip("no 1099-INT on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let expected = forms
        .iter()
        .map(|(_, form)| amount(form.interest_income))
        .sum::<f64>();
    Ok(compare_amounts(
        "Taxable interest",
        filing.income.interest,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn schedule_b_verdict(what: &str, total: f64, threshold: f64) -> Verdict {
    if total > threshold {
        Verdict::warn(
            money(total),
            format!("<= {}", money(threshold)),
            format!("{what} above {} must be itemized on Schedule B", money(threshold)),
        )
    } else {
        Verdict::pass(
            money(total),
            format!("<= {}", money(threshold)),
            format!("{what} is below the Schedule B threshold"),
        )
    }
}

fn interest_schedule_b(ctx: &RuleContext<'_>) -> Outcome {
    if ctx.session.interest_forms().next().is_none() {
        return Ok(Verdict::skip("no 1099-INT on file"));
    }
    let total = ctx
        .session
        .interest_forms()
        .map(|(_, form)| amount(form.interest_income))
        .sum::<f64>();
    Ok(schedule_b_verdict(
        "Interest",
        total,
        ctx.constants().schedule_b_threshold,
    ))
}

fn dividend_income_total(ctx: &RuleContext<'_>) -> Outcome {
    let forms = ctx.session.dividend_forms().collect::<Vec<_>>();
    if forms.is_empty() {
        return Ok(Verdict::skip("no 1099-DIV on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let expected = forms
        .iter()
        .map(|(_, form)| amount(form.ordinary_dividends))
        .sum::<f64>();
    Ok(compare_amounts(
        "Ordinary dividends",
        filing.income.ordinary_dividends,
        expected,
        DOLLAR,
        VerdictStatus::Fail,
    ))
}

fn qualified_dividends_within_ordinary(ctx: &RuleContext<'_>) -> Outcome {
    let forms = ctx
        .session
        .dividend_forms()
        .filter(|(_, form)| form.qualified_dividends.is_some())
        .collect::<Vec<_>>();
    if forms.is_empty() {
        return Ok(Verdict::skip("no 1099-DIV reports qualified dividends"));
    }
    let ordinary = forms
        .iter()
        .map(|(_, form)| amount(form.ordinary_dividends))
        .sum::<f64>();
    let qualified = forms
        .iter()
        .map(|(_, form)| amount(form.qualified_dividends))
        .sum::<f64>();
    let inverted = forms
        .iter()
        .filter(|(_, form)| amount(form.qualified_dividends) > amount(form.ordinary_dividends) + 0.005)
        .map(|(record, _)| record.document_id.0.as_str())
        .collect::<Vec<_>>();
    if inverted.is_empty() {
        Ok(Verdict::pass(
            money(qualified),
            format!("<= {}", money(ordinary)),
            "qualified dividends are a subset of ordinary dividends",
        ))
    } else {
        Ok(Verdict::fail(
            money(qualified),
            format!("<= {}", money(ordinary)),
            format!("qualified dividends exceed ordinary dividends on: {}", inverted.join(", ")),
        ))
    }
}

fn dividend_schedule_b(ctx: &RuleContext<'_>) -> Outcome {
    if ctx.session.dividend_forms().next().is_none() {
        return Ok(Verdict::skip("no 1099-DIV on file"));
    }
    let total = ctx
        .session
        .dividend_forms()
        .map(|(_, form)| amount(form.ordinary_dividends))
        .sum::<f64>();
    Ok(schedule_b_verdict(
        "Ordinary dividends",
        total,
        ctx.constants().schedule_b_threshold,
    ))
}

fn brokerage_gain_consistency(ctx: &RuleContext<'_>) -> Outcome {
    let complete = ctx
        .session
        .brokerage_forms()
        .filter_map(|(record, form)| match (form.proceeds, form.cost_basis, form.gain_loss) {
            (Some(proceeds), Some(basis), Some(gain)) => Some((record, proceeds - basis, gain)),
            _ => None,
        })
        .collect::<Vec<_>>();
    if complete.is_empty() {
        return Ok(Verdict::skip("no 1099-B reports proceeds, basis and gain together"));
    }
    let derived = complete.iter().map(|(_, derived, _)| derived).sum::<f64>();
    let reported = complete.iter().map(|(_, _, gain)| gain).sum::<f64>();
    let inconsistent = complete
        .iter()
        .filter(|(_, derived, gain)| (derived - gain).abs() > DOLLAR)
        .map(|(record, _, _)| record.document_id.0.as_str())
        .collect::<Vec<_>>();
    if inconsistent.is_empty() {
        Ok(Verdict::pass(
            money(reported),
            money(derived),
            "reported gain equals proceeds less cost basis",
        ))
    } else {
        Ok(Verdict::warn(
            money(reported),
            money(derived),
            format!(
                "reported gain differs from proceeds less basis on: {}; wash sales or adjustments may apply",
                inconsistent.join(", ")
            ),
        ))
    }
}

fn brokerage_term_split(ctx: &RuleContext<'_>) -> Outcome {
    let split = ctx
        .session
        .brokerage_forms()
        .filter(|(_, form)| form.short_term_gain.is_some() || form.long_term_gain.is_some())
        .map(|(_, form)| {
            (
                amount(form.short_term_gain) + amount(form.long_term_gain),
                form.net_gain(),
            )
        })
        .collect::<Vec<_>>();
    if split.is_empty() {
        return Ok(Verdict::skip("no 1099-B reports a short/long term split"));
    }
    let terms = split.iter().map(|(terms, _)| terms).sum::<f64>();
    let net = split.iter().map(|(_, net)| net).sum::<f64>();
    Ok(compare_amounts(
        "Short plus long term gain",
        terms,
        net,
        DOLLAR,
        VerdictStatus::Warn,
    ))
}

fn capital_loss_limit(ctx: &RuleContext<'_>) -> Outcome {
    if ctx.session.brokerage_forms().next().is_none() && ctx.session.manual.capital_gains == 0.0 {
        return Ok(Verdict::skip("no capital transactions on file"));
    }
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let limit = ctx.constants().capital_loss_limit.get(ctx.session.filing_status);
    let loss = (-filing.income.capital_gains).max(0.0);
    let verdict = check_ceiling("Net capital loss", loss, limit, VerdictStatus::Warn);
    if verdict.status == VerdictStatus::Warn {
        return Ok(Verdict::warn(
            money(filing.income.capital_gains),
            format!(">= -{}", money(limit)),
            format!(
                "only {} of net capital loss offsets income this year; {} carries forward and is overstated here",
                money(limit),
                money(loss - limit)
            ),
        ));
    }
    Ok(verdict)
}

fn duplicate_documents(ctx: &RuleContext<'_>) -> Outcome {
    let incomes = &ctx.session.incomes;
    if incomes.len() < 2 {
        return Ok(Verdict::skip("fewer than two documents on file"));
    }
    let mut groups: BTreeMap<(&str, String, i64), Vec<&str>> = BTreeMap::new();
    for record in incomes {
        if record.doc_type() == DocumentType::Unknown {
            continue;
        }
        let issuer = record
            .document
            .issuer()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let cents = (record.document.primary_amount() * 100.0).round() as i64;
        groups
            .entry((record.doc_type().label(), issuer, cents))
            .or_default()
            .push(record.document_id.0.as_str());
    }
    let duplicates = groups
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|((doc_type, _, _), ids)| format!("{doc_type} ({})", ids.join(", ")))
        .collect::<Vec<_>>();
    if duplicates.is_empty() {
        Ok(Verdict::pass(
            format!("{} documents", incomes.len()),
            "no duplicates",
            "no two documents share issuer, type and amount",
        ))
    } else {
        Ok(Verdict::warn(
            format!("{} possible duplicates", duplicates.len()),
            "no duplicates",
            format!(
                "documents share issuer, type and amount and may be counted twice: {}",
                duplicates.join("; ")
            ),
        ))
    }
}

fn unrecognized_documents(ctx: &RuleContext<'_>) -> Outcome {
    let incomes = &ctx.session.incomes;
    if incomes.is_empty() {
        return Ok(Verdict::skip("no documents on file"));
    }
    let unknown = incomes
        .iter()
        .filter(|record| record.doc_type() == DocumentType::Unknown)
        .map(|record| record.document_id.0.as_str())
        .collect::<Vec<_>>();
    if unknown.is_empty() {
        Ok(Verdict::pass(
            "0 unrecognized",
            "0 unrecognized",
            "every document was classified",
        ))
    } else {
        Ok(Verdict::warn(
            format!("{} unrecognized", unknown.len()),
            "0 unrecognized",
            format!(
                "documents were not classified and contribute nothing: {}",
                unknown.join(", ")
            ),
        )
        .extracted(false))
    }
}
