use std::collections::HashSet;

use taxcheck::workflows::filing::rules::RuleStage;
use taxcheck::workflows::filing::{
    FilingComputation, FilingStatus, RuleContext, RuleRegistry, RulesEngine, Scenario, StateCode,
    TaxConstants, TaxSession,
};
use taxcheck::workflows::manual::ManualIncomeImporter;

#[test]
fn catalog_has_unique_ids_and_covers_every_scenario() {
    let registry = RuleRegistry::standard();
    assert!(registry.len() >= 70, "catalog has {} rules", registry.len());

    let ids: HashSet<_> = registry.rules().iter().map(|rule| rule.id).collect();
    assert_eq!(ids.len(), registry.len(), "rule ids must be unique");

    for scenario in Scenario::ordered() {
        assert!(
            registry
                .rules()
                .iter()
                .any(|rule| rule.applies_to(Some(scenario))),
            "no rules for {}",
            scenario.tag()
        );
    }
    for stage in RuleStage::ordered() {
        assert!(!registry.for_stage(stage).is_empty(), "empty stage {stage:?}");
    }
}

#[test]
fn profile_tracks_documents_and_state() {
    let sheet = "document_id,doc_type,payer_name,amount,federal_withheld,state_withheld\n\
w2-acme,W-2,Acme Corp,80000,9000,2500\n\
int-bank,1099-INT,First Bank,300,,\n";
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.state = Some(StateCode::NewYork);
    ManualIncomeImporter::from_reader(sheet.as_bytes())
        .expect("sheet imports")
        .apply(&mut session);

    assert_eq!(
        Scenario::profile(&session),
        vec![Scenario::FedW2, Scenario::FedInvestments, Scenario::NyW2]
    );
}

#[test]
fn unevaluated_session_scores_zero_without_errors() {
    let constants = TaxConstants::standard();
    let session = TaxSession::new(2025, FilingStatus::HeadOfHousehold);
    let report = RulesEngine::default().evaluate(&RuleContext::for_session(&session, &constants), None);

    assert_eq!(report.summary.total, report.results.len());
    assert_eq!(report.summary.errored, 0);
    assert_eq!(
        report.summary.passed
            + report.summary.failed
            + report.summary.warned
            + report.summary.skipped,
        report.summary.total
    );
}

#[test]
fn state_scenario_only_runs_state_rules() {
    let constants = TaxConstants::standard();
    let sheet = "document_id,doc_type,payer_name,amount,federal_withheld,state_withheld\n\
w2-acme,W-2,Acme Corp,80000,9000,3100\n";
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.state = Some(StateCode::California);
    ManualIncomeImporter::from_reader(sheet.as_bytes())
        .expect("sheet imports")
        .apply(&mut session);
    session.filing = Some(FilingComputation::compute(&session, &constants));

    let engine = RulesEngine::default();
    let report = engine.evaluate(
        &RuleContext::for_session(&session, &constants),
        Some(Scenario::CaW2),
    );
    assert!(!report.results.is_empty());
    for result in &report.results {
        let rule = engine.registry().get(result.id).expect("registered rule");
        assert!(
            !rule.applies_to(Some(Scenario::FedW2)),
            "{} is a federal rule",
            result.id
        );
    }
    assert!(report.result("ca-mental-health-surtax").is_some());
    assert_eq!(report.scenario, Some(Scenario::CaW2));
}
