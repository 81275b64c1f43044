use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::filing::domain::{
    DocumentId, ExtractionStatus, FilingStatus, Form1099Nec, IncomeDocument, IncomeRecord,
    RecordSource, SessionId, StateCode, TaxSession, W2,
};
use crate::workflows::filing::repository::{RepositoryError, SessionRecord, SessionRepository};
use crate::workflows::filing::service::{FilingDefaults, FilingService, SessionDraft};
use crate::workflows::filing::{filing_router, TaxConstants};

pub(super) fn constants() -> TaxConstants {
    TaxConstants::standard()
}

pub(super) fn w2_record(id: &str, wages: f64, withheld: f64) -> IncomeRecord {
    let mut extraction_status = BTreeMap::new();
    extraction_status.insert("wages".to_string(), ExtractionStatus::Extracted);
    extraction_status.insert(
        "fed_income_tax_withheld".to_string(),
        ExtractionStatus::Extracted,
    );
    IncomeRecord {
        document_id: DocumentId(id.to_string()),
        source: RecordSource::Extracted,
        document: IncomeDocument::W2(W2 {
            employer_name: Some("Acme Corp".to_string()),
            employer_ein: Some("12-3456789".to_string()),
            wages: Some(wages),
            fed_income_tax_withheld: Some(withheld),
            social_security_wages: Some(wages),
            social_security_tax_withheld: Some((wages * 0.062 * 100.0).round() / 100.0),
            medicare_wages: Some(wages),
            medicare_tax_withheld: Some((wages * 0.0145 * 100.0).round() / 100.0),
            ..W2::default()
        }),
        extraction_status,
    }
}

pub(super) fn nec_record(id: &str, compensation: f64) -> IncomeRecord {
    IncomeRecord {
        document_id: DocumentId(id.to_string()),
        source: RecordSource::Manual,
        document: IncomeDocument::Form1099Nec(Form1099Nec {
            payer_name: Some("Blog Media".to_string()),
            nonemployee_compensation: Some(compensation),
            ..Form1099Nec::default()
        }),
        extraction_status: BTreeMap::new(),
    }
}

/// Single filer, 2025, one W-2 with $80,000 wages and $9,000 withheld.
pub(super) fn w2_session() -> TaxSession {
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.upsert_income(w2_record("w2-acme", 80_000.0, 9_000.0));
    session
}

pub(super) fn nec_session(compensation: f64) -> TaxSession {
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.upsert_income(nec_record("nec-blog", compensation));
    session
}

pub(super) fn california_w2_session() -> TaxSession {
    let mut session = w2_session();
    session.state = Some(StateCode::California);
    session
}

pub(super) fn draft() -> SessionDraft {
    SessionDraft {
        filing_status: FilingStatus::Single,
        ..SessionDraft::default()
    }
}

pub(super) const W2_EXTRACTION: &str = "This is a 2025 W-2 from Acme Corp.\n\n\
<extracted_data>{\"doc_type\": \"W-2\", \"employer_name\": \"Acme Corp\", \"wages\": 80000, \
\"fed_income_tax_withheld\": 9000, \"state\": null, \"box12_codes\": null, \
\"extraction_status\": {\"wages\": \"extracted\", \"fed_income_tax_withheld\": \"extracted\", \
\"state\": \"not_found\"}}</extracted_data>";

pub(super) fn build_service() -> (FilingService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = FilingService::new(repository.clone(), FilingDefaults::default());
    (service, repository)
}

pub(super) fn filing_router_with_service(
    service: FilingService<MemoryRepository>,
) -> axum::Router {
    filing_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.session_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.session_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get(&record.session_id) {
            Some(stored) if !record.follows(stored) => Err(RepositoryError::Stale),
            _ => {
                guard.insert(record.session_id.clone(), record);
                Ok(())
            }
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct ConflictRepository;

impl SessionRepository for ConflictRepository {
    fn insert(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: SessionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        Ok(None)
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: SessionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
