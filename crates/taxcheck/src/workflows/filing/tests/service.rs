use std::sync::Arc;

use super::common::*;
use crate::workflows::extraction::{ExtractionError, UploadRejected};
use crate::workflows::filing::domain::{
    DocumentId, FilingStatus, GapAnswer, SessionId, StateCode, TaxSession,
};
use crate::workflows::filing::repository::{RepositoryError, SessionRepository};
use crate::workflows::filing::rules::{Scenario, VerdictStatus};
use crate::workflows::filing::service::{
    ExtractionUpload, FilingDefaults, FilingService, FilingServiceError,
};

fn upload(response: &str) -> ExtractionUpload {
    ExtractionUpload {
        document_id: Some(DocumentId("w2-acme".to_string())),
        file_name: "w2.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        size_bytes: 48_000,
        response: response.to_string(),
    }
}

#[test]
fn create_applies_defaults() {
    let repository = Arc::new(MemoryRepository::default());
    let service = FilingService::new(
        repository.clone(),
        FilingDefaults {
            tax_year: 2024,
            state: Some(StateCode::NewYork),
        },
    );

    let record = service.create(draft()).expect("session created");
    assert!(record.session_id.0.starts_with("ses-"));
    assert_eq!(record.session.tax_year, 2024);
    assert_eq!(record.session.state, Some(StateCode::NewYork));
    assert!(repository
        .fetch(&record.session_id)
        .expect("fetch succeeds")
        .is_some());
}

#[test]
fn create_propagates_conflicts() {
    let service = FilingService::new(Arc::new(ConflictRepository), FilingDefaults::default());
    match service.create(draft()) {
        Err(FilingServiceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn get_propagates_not_found() {
    let (service, _) = build_service();
    match service.get(&SessionId("missing".to_string())) {
        Err(FilingServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn upsert_replaces_by_document_id_and_clears_filing() {
    let (service, repository) = build_service();
    let record = service.create(draft()).expect("session created");
    let id = record.session_id;

    let first = service
        .upsert_income(&id, w2_record("w2-acme", 80_000.0, 9_000.0))
        .expect("first upsert");
    assert!(!first.replaced);
    service.compute(&id).expect("computed");

    let second = service
        .upsert_income(&id, w2_record("w2-acme", 81_000.0, 9_000.0))
        .expect("second upsert");
    assert!(second.replaced);
    assert_eq!(second.income_count, 1);

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert!(stored.session.filing.is_none());
    assert!(stored.updated_at >= stored.created_at);
}

#[test]
fn writes_from_an_outdated_read_are_rejected() {
    let (service, repository) = build_service();
    let id = service.create(draft()).expect("session created").session_id;
    let mut outdated = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");

    service
        .upsert_income(&id, w2_record("w2-acme", 80_000.0, 9_000.0))
        .expect("upsert");
    service.compute(&id).expect("computed");

    outdated.session.manual.other_income = 2_000.0;
    outdated.touch();
    assert!(matches!(
        repository.update(outdated),
        Err(RepositoryError::Stale)
    ));

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.revision, 2);
    assert_eq!(stored.session.incomes.len(), 1);
    assert_eq!(stored.session.manual.other_income, 0.0);
}

#[test]
fn ingest_extraction_stores_document_and_record() {
    let (service, repository) = build_service();
    let id = service.create(draft()).expect("session created").session_id;

    let outcome = service
        .ingest_extraction(&id, upload(W2_EXTRACTION))
        .expect("extraction ingested");
    assert_eq!(outcome.upsert.document_id.0, "w2-acme");
    assert_eq!(outcome.narrative, vec!["This is a 2025 W-2 from Acme Corp."]);
    assert_eq!(outcome.missing_fields, vec!["state"]);

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.session.documents.len(), 1);
    assert_eq!(stored.session.documents[0].content_type, "application/pdf");

    let filing = service.compute(&id).expect("computed");
    assert_eq!(filing.net_result, -214.0);
}

#[test]
fn ingest_extraction_rejects_bad_uploads() {
    let (service, _) = build_service();
    let id = service.create(draft()).expect("session created").session_id;

    let mut csv = upload(W2_EXTRACTION);
    csv.content_type = "text/csv".to_string();
    assert!(matches!(
        service.ingest_extraction(&id, csv),
        Err(FilingServiceError::Upload(UploadRejected::UnsupportedType(_)))
    ));

    let mut huge = upload(W2_EXTRACTION);
    huge.size_bytes = 11 * 1024 * 1024;
    assert!(matches!(
        service.ingest_extraction(&id, huge),
        Err(FilingServiceError::Upload(UploadRejected::TooLarge { .. }))
    ));

    assert!(matches!(
        service.ingest_extraction(&id, upload("I could not read this document.")),
        Err(FilingServiceError::Extraction(ExtractionError::MissingBlock))
    ));
    assert!(service.get(&id).expect("session").session.incomes.is_empty());
}

#[test]
fn gap_answers_are_validated_and_recorded() {
    let (service, _) = build_service();
    let id = service.create(draft()).expect("session created").session_id;
    service
        .upsert_income(&id, w2_record("w2-acme", 80_000.0, 9_000.0))
        .expect("upsert");

    assert!(matches!(
        service.record_gap_answer(&id, "hasYacht", GapAnswer::Flag(true)),
        Err(FilingServiceError::UnknownQuestion(_))
    ));

    let before = service.gaps(&id).expect("gaps");
    assert!(before.iter().any(|question| question.id == "has401k"));
    service
        .record_gap_answer(&id, "has401k", GapAnswer::Amount(6_000.0))
        .expect("answer recorded");
    let after = service.gaps(&id).expect("gaps");
    assert!(after.iter().all(|question| question.id != "has401k"));
    assert_eq!(after.len(), before.len() - 1);
}

#[test]
fn evaluate_recomputes_before_running_rules() {
    let (service, repository) = build_service();
    let id = service.create(draft()).expect("session created").session_id;
    service
        .upsert_income(&id, w2_record("w2-acme", 80_000.0, 9_000.0))
        .expect("upsert");

    let report = service
        .evaluate(&id, Some(Scenario::FedW2))
        .expect("evaluated");
    assert_eq!(
        report
            .result("federal-tax-brackets")
            .map(|result| result.status),
        Some(VerdictStatus::Pass)
    );
    assert!(report.summary.evaluated());

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert!(stored.session.filing.is_some());
}

#[test]
fn evaluate_session_reports_all_three_outputs() {
    let (service, _) = build_service();
    let mut session = w2_session();

    let evaluation = service.evaluate_session(&mut session, None);
    assert_eq!(evaluation.filing.net_result, -214.0);
    assert_eq!(evaluation.report.results.len(), service.engine().registry().len());
    assert!(!evaluation.gaps.is_empty());
    assert_eq!(session.filing.as_ref(), Some(&evaluation.filing));
}

#[test]
fn blank_session_is_not_yet_evaluated() {
    let (service, _) = build_service();
    for state in [None, Some(StateCode::California), Some(StateCode::NewYork)] {
        let mut session = TaxSession::new(2025, FilingStatus::Single);
        session.state = state;
        session.manual.is_renter = true;

        let evaluation = service.evaluate_session(&mut session, None);
        let summary = evaluation.report.summary;
        assert!(session.filing.is_some());
        assert_eq!(summary.passed, 0, "{state:?}");
        assert!(!summary.evaluated(), "{state:?}");
        assert_eq!(summary.score_label(), "not yet evaluated");
    }
}

#[test]
fn one_entered_amount_starts_scoring() {
    let (service, _) = build_service();
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.manual.other_income = 1_200.0;

    let report = service.evaluate_session(&mut session, None).report;
    assert!(report.summary.evaluated());
    assert_eq!(
        report
            .result("taxable-income-derivation")
            .map(|result| result.status),
        Some(VerdictStatus::Pass)
    );
}

#[test]
fn repository_outages_surface_as_errors() {
    let service = FilingService::new(Arc::new(UnavailableRepository), FilingDefaults::default());
    assert!(matches!(
        service.compute(&SessionId("ses-000001".to_string())),
        Err(FilingServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}
