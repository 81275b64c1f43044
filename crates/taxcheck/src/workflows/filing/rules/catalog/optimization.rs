use super::super::super::brackets::marginal_rate;
use super::super::registry::{Citation, RuleDescriptor, RuleKind, RuleStage, Severity};
use super::super::support::{has_inputs, money, percent, NOT_COMPUTED, NO_INPUTS};
use super::super::verdict::{EvaluationError, Verdict};
use super::super::RuleContext;
use super::{FEDERAL, W2};

type Outcome = Result<Verdict, EvaluationError>;

const LARGE_REFUND: f64 = 3_000.0;

pub(super) fn rules() -> Vec<RuleDescriptor> {
    vec![
        RuleDescriptor {
            id: "ira-headroom",
            name: "Unused IRA contribution room",
            citation: Citation::new("IRC §219", "Schedule 1", "Line 20"),
            scenarios: FEDERAL,
            stage: RuleStage::Optimization,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: ira_headroom,
        },
        RuleDescriptor {
            id: "hsa-headroom",
            name: "Unused HSA contribution room",
            citation: Citation::new("IRC §223", "Form 8889", "Line 13"),
            scenarios: FEDERAL,
            stage: RuleStage::Optimization,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: hsa_headroom,
        },
        RuleDescriptor {
            id: "elective-deferral-headroom",
            name: "Unused 401(k) deferral room",
            citation: Citation::new("IRC §402(g)", "Form W-2", "Box 12 code D"),
            scenarios: W2,
            stage: RuleStage::Optimization,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: elective_deferral_headroom,
        },
        RuleDescriptor {
            id: "refund-size",
            name: "Large refund suggests over-withholding",
            citation: Citation::new("IRC §3402(f)", "Form W-4", "Step 4"),
            scenarios: FEDERAL,
            stage: RuleStage::Optimization,
            severity: Severity::Info,
            kind: RuleKind::Savings,
            check: refund_size,
        },
    ]
}

fn headroom_verdict(
    ctx: &RuleContext<'_>,
    what: &str,
    contributed: f64,
    limit: f64,
) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    let room = (limit - contributed).max(0.0);
    if room <= 0.0 {
        return Ok(Verdict::pass(
            money(contributed),
            money(limit),
            format!("{what} is at the annual limit"),
        ));
    }
    if filing.taxable_income <= 0.0 {
        return Ok(Verdict::skip("no taxable income to offset"));
    }
    let rate = marginal_rate(filing.taxable_income, ctx.federal.brackets);
    let savings = (room.min(filing.taxable_income) * rate).round();
    Ok(Verdict::warn(
        money(contributed),
        money(limit),
        format!(
            "contributing another {} to {what} could save about {} at the {} marginal rate",
            money(room),
            money(savings),
            percent(rate)
        ),
    ))
}

fn ira_headroom(ctx: &RuleContext<'_>) -> Outcome {
    headroom_verdict(
        ctx,
        "an IRA",
        ctx.session.manual.retirement_contributions,
        ctx.constants().limits.ira,
    )
}

fn hsa_headroom(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    let manual = &session.manual;
    let employer = session
        .w2s()
        .map(|(_, form)| form.box12_total(&["W"]))
        .sum::<f64>();
    let contributed = manual.hsa_contributions + employer;
    let eligible = contributed > 0.0 || session.answer_flag("hasHsa") == Some(true);
    if !eligible {
        return Ok(Verdict::skip("no HSA-eligible health plan indicated"));
    }
    headroom_verdict(
        ctx,
        "the HSA",
        contributed,
        ctx.constants().limits.hsa(manual.hsa_family_coverage),
    )
}

fn elective_deferral_headroom(ctx: &RuleContext<'_>) -> Outcome {
    let session = ctx.session;
    let deferred = session
        .w2s()
        .map(|(_, form)| form.box12_total(&["D"]))
        .sum::<f64>();
    let offered = deferred > 0.0 || session.answer_flag("has401k") == Some(true);
    if !offered {
        return Ok(Verdict::skip("no workplace 401(k) indicated"));
    }
    headroom_verdict(
        ctx,
        "the 401(k)",
        deferred,
        ctx.constants().limits.elective_deferral,
    )
}

fn refund_size(ctx: &RuleContext<'_>) -> Outcome {
    let Some(filing) = ctx.filing else {
        return Ok(Verdict::skip(NOT_COMPUTED));
    };
    if !has_inputs(ctx.session) {
        return Ok(Verdict::skip(NO_INPUTS));
    }
    if filing.net_result > LARGE_REFUND {
        Ok(Verdict::warn(
            money(filing.net_result),
            format!("<= {}", money(LARGE_REFUND)),
            "a large refund means tax was over-withheld during the year; adjusting Form W-4 keeps that cash in each paycheck",
        ))
    } else {
        Ok(Verdict::pass(
            money(filing.net_result),
            format!("<= {}", money(LARGE_REFUND)),
            "withholding is close to the actual liability",
        ))
    }
}
