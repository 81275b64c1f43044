use super::common::*;
use crate::workflows::filing::computation::FilingComputation;
use crate::workflows::filing::domain::{FilingStatus, TaxSession};
use crate::workflows::filing::rules::{
    Citation, EvaluationError, RuleContext, RuleDescriptor, RuleKind, RuleRegistry, RuleStage,
    RulesEngine, Scenario, Severity, Verdict, VerdictStatus,
};

const EVERY: &[Scenario] = &[Scenario::FedW2, Scenario::Fed1099];

fn rule(
    id: &'static str,
    check: fn(&RuleContext<'_>) -> Result<Verdict, EvaluationError>,
) -> RuleDescriptor {
    RuleDescriptor {
        id,
        name: id,
        citation: Citation::new("IRC §1", "Form 1040", "Line 1"),
        scenarios: EVERY,
        stage: RuleStage::Computation,
        severity: Severity::Critical,
        kind: RuleKind::Compliance,
        check,
    }
}

fn passing(_ctx: &RuleContext<'_>) -> Result<Verdict, EvaluationError> {
    Ok(Verdict::pass("$1", "$1", "matches"))
}

fn failing(_ctx: &RuleContext<'_>) -> Result<Verdict, EvaluationError> {
    Ok(Verdict::fail("$1", "$2", "differs"))
}

fn warning(_ctx: &RuleContext<'_>) -> Result<Verdict, EvaluationError> {
    Ok(Verdict::warn("$1", "$2", "close"))
}

fn erroring(_ctx: &RuleContext<'_>) -> Result<Verdict, EvaluationError> {
    Err(EvaluationError::MissingField("box 1"))
}

fn panicking(_ctx: &RuleContext<'_>) -> Result<Verdict, EvaluationError> {
    panic!("predicate exploded")
}

fn computed(session: &mut TaxSession) {
    session.filing = Some(FilingComputation::compute(session, &constants()));
}

#[test]
fn standard_catalog_has_about_seventy_rules() {
    let registry = RuleRegistry::standard();
    assert!(registry.len() >= 70, "only {} rules", registry.len());
}

#[test]
fn failing_predicates_are_isolated() {
    let engine = RulesEngine::new(RuleRegistry::with_rules(vec![
        rule("errors", erroring),
        rule("panics", panicking),
        rule("passes", passing),
    ]));
    let session = w2_session();
    let context = RuleContext::for_session(&session, &constants());

    let report = engine.evaluate(&context, None);

    assert_eq!(report.results.len(), 3);
    let errored = report.result("errors").expect("errors result");
    assert_eq!(errored.status, VerdictStatus::Skip);
    assert!(errored.errored);
    assert!(errored.detail.contains("box 1"));
    let panicked = report.result("panics").expect("panics result");
    assert_eq!(panicked.status, VerdictStatus::Skip);
    assert!(panicked.detail.contains("predicate exploded"));
    assert_eq!(
        report.result("passes").map(|result| result.status),
        Some(VerdictStatus::Pass)
    );
    assert_eq!(report.summary.errored, 2);
    assert_eq!(report.summary.scored_count, 1);
    assert_eq!(report.summary.score, 100);
}

#[test]
fn all_skipped_differs_from_all_failed() {
    let session = TaxSession::new(2025, FilingStatus::Single);
    let constants = constants();
    let context = RuleContext::for_session(&session, &constants);

    let skipped = RulesEngine::default().evaluate(&context, None);
    assert_eq!(skipped.summary.skipped, skipped.summary.total);
    assert_eq!(skipped.summary.score, 0);
    assert!(!skipped.summary.evaluated());
    assert_eq!(skipped.summary.score_label(), "not yet evaluated");

    let failed = RulesEngine::new(RuleRegistry::with_rules(vec![
        rule("first", failing),
        rule("second", failing),
    ]))
    .evaluate(&context, None);
    assert_eq!(failed.summary.score, 0);
    assert!(failed.summary.evaluated());
    assert_eq!(failed.summary.score_label(), "0%");
}

#[test]
fn warnings_earn_half_credit() {
    let session = TaxSession::new(2025, FilingStatus::Single);
    let constants = constants();
    let context = RuleContext::for_session(&session, &constants);
    let report = RulesEngine::new(RuleRegistry::with_rules(vec![
        rule("passes", passing),
        rule("warns", warning),
    ]))
    .evaluate(&context, None);
    assert_eq!(report.summary.score, 75);
}

#[test]
fn scenario_filter_selects_tagged_rules() {
    let engine = RulesEngine::default();
    let mut session = california_w2_session();
    computed(&mut session);
    let constants = constants();
    let context = RuleContext::for_session(&session, &constants);

    let federal = engine.evaluate(&context, Some(Scenario::Fed1099));
    assert!(!federal.results.is_empty());
    assert!(federal
        .results
        .iter()
        .all(|result| !result.id.starts_with("ca-") && !result.id.starts_with("state-")));

    let california = engine.evaluate(&context, Some(Scenario::CaW2));
    assert!(california.result("ca-mental-health-surtax").is_some());
    assert!(california.result("nec-compensation-total").is_none());
    for result in &california.results {
        let descriptor = engine.registry().get(result.id).expect("registered");
        assert!(descriptor.scenarios.contains(&Scenario::CaW2));
    }

    let everything = engine.evaluate(&context, None);
    assert_eq!(everything.results.len(), engine.registry().len());
}

#[test]
fn computed_w2_session_checks_out() {
    let mut session = w2_session();
    computed(&mut session);
    let constants = constants();
    let context = RuleContext::for_session(&session, &constants);
    let report = RulesEngine::default().evaluate(&context, Some(Scenario::FedW2));

    for id in [
        "w2-wages-total",
        "taxable-income-derivation",
        "federal-tax-brackets",
        "net-result-balance",
        "underpayment-penalty-risk",
    ] {
        assert_eq!(
            report.result(id).map(|result| result.status),
            Some(VerdictStatus::Pass),
            "{id}"
        );
    }
    assert!(report.summary.evaluated());
}

#[test]
fn tampered_filing_fails_bracket_check() {
    let mut session = w2_session();
    let mut filing = FilingComputation::compute(&session, &constants());
    filing.federal_income_tax += 500.0;
    session.filing = Some(filing);
    let constants = constants();
    let context = RuleContext::for_session(&session, &constants);

    let report = RulesEngine::default().evaluate(&context, Some(Scenario::FedW2));
    assert_eq!(
        report
            .result("federal-tax-brackets")
            .map(|result| result.status),
        Some(VerdictStatus::Fail)
    );
}

#[test]
fn stage_grouping_follows_presentation_order() {
    let mut session = nec_session(40_000.0);
    computed(&mut session);
    let constants = constants();
    let context = RuleContext::for_session(&session, &constants);
    let report = RulesEngine::default().evaluate(&context, None);

    let stages = report
        .by_stage()
        .into_iter()
        .map(|(stage, _)| stage)
        .collect::<Vec<_>>();
    let mut sorted = stages.clone();
    sorted.sort();
    assert_eq!(stages, sorted);
    assert_eq!(stages.first(), Some(&RuleStage::IncomeReporting));
}
