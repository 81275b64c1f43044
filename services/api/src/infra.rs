use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use taxcheck::error::AppError;
use taxcheck::workflows::filing::{
    RepositoryError, Scenario, SessionId, SessionRecord, SessionRepository, TaxSession,
};
use taxcheck::workflows::manual::ManualIncomeImporter;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
}

impl InMemorySessionRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.session_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.session_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.get(&record.session_id) {
            Some(stored) if !record.follows(stored) => Err(RepositoryError::Stale),
            Some(_) => {
                guard.insert(record.session_id.clone(), record);
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }
}

pub(crate) fn parse_scenario(raw: &str) -> Result<Scenario, String> {
    raw.parse::<Scenario>().map_err(|err| {
        let known = Scenario::ordered().map(Scenario::tag).join(", ");
        format!("{err} (expected one of: {known})")
    })
}

/// Read a session JSON file and merge an optional manual income sheet into it.
pub(crate) fn load_session(path: &Path, manual_csv: Option<&Path>) -> Result<TaxSession, AppError> {
    let raw = fs::read_to_string(path)?;
    let mut session: TaxSession = serde_json::from_str(&raw)?;
    if let Some(sheet) = manual_csv {
        ManualIncomeImporter::from_path(sheet)?.apply(&mut session);
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxcheck::workflows::filing::FilingStatus;

    #[test]
    fn repository_rejects_duplicates_and_unknown_updates() {
        let repository = InMemorySessionRepository::default();
        let record = SessionRecord::new(
            SessionId("ses-test".to_string()),
            TaxSession::new(2025, FilingStatus::Single),
        );

        repository.insert(record.clone()).expect("first insert");
        assert!(matches!(
            repository.insert(record.clone()),
            Err(RepositoryError::Conflict)
        ));

        let stranger = SessionRecord::new(
            SessionId("ses-other".to_string()),
            TaxSession::new(2025, FilingStatus::Single),
        );
        assert!(matches!(
            repository.update(stranger),
            Err(RepositoryError::NotFound)
        ));
        assert!(repository
            .fetch(&record.session_id)
            .expect("fetch")
            .is_some());
    }

    #[test]
    fn repository_rejects_writes_from_a_stale_read() {
        let repository = InMemorySessionRepository::default();
        let record = SessionRecord::new(
            SessionId("ses-race".to_string()),
            TaxSession::new(2025, FilingStatus::Single),
        );
        repository.insert(record.clone()).expect("insert");

        let mut first = repository.fetch(&record.session_id).expect("fetch").expect("stored");
        let mut second = first.clone();
        first.session.manual.other_income = 1_000.0;
        first.touch();
        second.session.manual.estimated_payments = 500.0;
        second.touch();

        repository.update(first).expect("first writer wins");
        assert!(matches!(
            repository.update(second),
            Err(RepositoryError::Stale)
        ));
        let stored = repository.fetch(&record.session_id).expect("fetch").expect("stored");
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.session.manual.other_income, 1_000.0);
        assert_eq!(stored.session.manual.estimated_payments, 0.0);
    }

    #[test]
    fn scenario_parser_lists_known_tags() {
        assert_eq!(parse_scenario("CA-W2"), Ok(Scenario::CaW2));
        let message = parse_scenario("tx-w2").expect_err("unknown tag");
        assert!(message.contains("fed-investments"));
    }
}
