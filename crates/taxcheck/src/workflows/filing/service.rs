use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::computation::FilingComputation;
use super::constants::TaxConstants;
use super::domain::{
    DeductionChoice, Dependents, DocumentDescriptor, DocumentId, FilingStatus, GapAnswer,
    IncomeRecord, ManualEntries, SessionId, StateCode, TaxSession,
};
use super::gaps::{GapCatalog, GapQuestionDescriptor};
use super::repository::{RepositoryError, SessionRecord, SessionRepository};
use super::rules::{EvaluationReport, RuleContext, RulesEngine, Scenario};
use crate::workflows::extraction::{
    narrative_paragraphs, parse_extraction_response, ExtractionError, UploadPolicy,
    UploadRejected,
};

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("ses-{id:06}"))
}

/// Values applied when a draft leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilingDefaults {
    pub tax_year: u16,
    pub state: Option<StateCode>,
}

impl Default for FilingDefaults {
    fn default() -> Self {
        Self {
            tax_year: 2025,
            state: None,
        }
    }
}

/// Interview answers captured before any document is uploaded.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionDraft {
    pub tax_year: Option<u16>,
    pub filing_status: FilingStatus,
    pub state: Option<StateCode>,
    pub dependents: Dependents,
    pub manual: ManualEntries,
    pub deduction_choice: DeductionChoice,
}

/// Raw extraction reply plus the metadata of the file it was produced from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionUpload {
    #[serde(default)]
    pub document_id: Option<DocumentId>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub response: String,
}

impl ExtractionUpload {
    fn document_id(&self) -> DocumentId {
        self.document_id
            .clone()
            .unwrap_or_else(|| DocumentId(self.file_name.clone()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IncomeUpsert {
    pub session_id: SessionId,
    pub document_id: DocumentId,
    pub replaced: bool,
    pub income_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    #[serde(flatten)]
    pub upsert: IncomeUpsert,
    pub narrative: Vec<String>,
    pub missing_fields: Vec<String>,
}

/// Computation, rule report, and open questions for one session snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvaluation {
    pub filing: FilingComputation,
    pub report: EvaluationReport,
    pub gaps: Vec<GapQuestionDescriptor>,
}

/// Service composing the session repository with the shared tax tables and rule catalog.
pub struct FilingService<R> {
    repository: Arc<R>,
    constants: Arc<TaxConstants>,
    engine: Arc<RulesEngine>,
    gaps: Arc<GapCatalog>,
    upload_policy: UploadPolicy,
    defaults: FilingDefaults,
}

impl<R> FilingService<R>
where
    R: SessionRepository + 'static,
{
    pub fn new(repository: Arc<R>, defaults: FilingDefaults) -> Self {
        Self::with_parts(
            repository,
            Arc::new(TaxConstants::standard()),
            Arc::new(RulesEngine::default()),
            Arc::new(GapCatalog::standard()),
            defaults,
        )
    }

    pub fn with_parts(
        repository: Arc<R>,
        constants: Arc<TaxConstants>,
        engine: Arc<RulesEngine>,
        gaps: Arc<GapCatalog>,
        defaults: FilingDefaults,
    ) -> Self {
        Self {
            repository,
            constants,
            engine,
            gaps,
            upload_policy: UploadPolicy::default(),
            defaults,
        }
    }

    pub fn constants(&self) -> &TaxConstants {
        &self.constants
    }

    pub fn engine(&self) -> &RulesEngine {
        &self.engine
    }

    /// Open a new session from interview answers.
    pub fn create(&self, draft: SessionDraft) -> Result<SessionRecord, FilingServiceError> {
        let tax_year = draft.tax_year.unwrap_or(self.defaults.tax_year);
        let mut session = TaxSession::new(tax_year, draft.filing_status);
        session.state = draft.state.or(self.defaults.state);
        session.dependents = draft.dependents;
        session.manual = draft.manual;
        session.deduction_choice = draft.deduction_choice;

        let record = SessionRecord::new(next_session_id(), session);
        let stored = self.repository.insert(record)?;
        info!(
            session_id = %stored.session_id.0,
            tax_year,
            filing_status = stored.session.filing_status.label(),
            "tax session created"
        );
        Ok(stored)
    }

    pub fn get(&self, session_id: &SessionId) -> Result<SessionRecord, FilingServiceError> {
        let record = self
            .repository
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Insert or replace an income record keyed by its document id.
    pub fn upsert_income(
        &self,
        session_id: &SessionId,
        income: IncomeRecord,
    ) -> Result<IncomeUpsert, FilingServiceError> {
        let mut record = self.get(session_id)?;
        let document_id = income.document_id.clone();
        let replaced = record.session.upsert_income(income);
        let income_count = record.session.incomes.len();
        record.touch();
        self.repository.update(record)?;

        info!(
            session_id = %session_id.0,
            document_id = %document_id.0,
            replaced,
            income_count,
            "income record stored"
        );
        Ok(IncomeUpsert {
            session_id: session_id.clone(),
            document_id,
            replaced,
            income_count,
        })
    }

    /// Admit an uploaded file's extraction reply and store the parsed record.
    pub fn ingest_extraction(
        &self,
        session_id: &SessionId,
        upload: ExtractionUpload,
    ) -> Result<ExtractionOutcome, FilingServiceError> {
        let mime = self
            .upload_policy
            .validate(&upload.content_type, upload.size_bytes)?;
        let extracted = parse_extraction_response(&upload.response)?;
        let narrative = narrative_paragraphs(&upload.response);
        let document_id = upload.document_id();

        let mut record = self.get(session_id)?;
        record.session.upsert_document(DocumentDescriptor {
            document_id: document_id.clone(),
            file_name: upload.file_name.clone(),
            content_type: mime.essence_str().to_string(),
            size_bytes: upload.size_bytes,
        });

        let income = extracted.into_income_record(document_id.clone());
        let missing_fields = income
            .missing_fields()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        debug!(
            session_id = %session_id.0,
            doc_type = income.doc_type().label(),
            missing = missing_fields.len(),
            "extraction parsed"
        );
        let replaced = record.session.upsert_income(income);
        let income_count = record.session.incomes.len();
        record.touch();
        self.repository.update(record)?;

        info!(
            session_id = %session_id.0,
            document_id = %document_id.0,
            replaced,
            "extracted document stored"
        );
        Ok(ExtractionOutcome {
            upsert: IncomeUpsert {
                session_id: session_id.clone(),
                document_id,
                replaced,
                income_count,
            },
            narrative,
            missing_fields,
        })
    }

    pub fn record_gap_answer(
        &self,
        session_id: &SessionId,
        question_id: &str,
        answer: GapAnswer,
    ) -> Result<SessionRecord, FilingServiceError> {
        if self.gaps.get(question_id).is_none() {
            return Err(FilingServiceError::UnknownQuestion(question_id.to_string()));
        }
        let mut record = self.get(session_id)?;
        record.session.record_gap_answer(question_id, answer);
        record.touch();
        self.repository.update(record.clone())?;
        debug!(session_id = %session_id.0, question_id, "gap answer recorded");
        Ok(record)
    }

    /// Recompute the filing from scratch and store it on the session.
    pub fn compute(&self, session_id: &SessionId) -> Result<FilingComputation, FilingServiceError> {
        let mut record = self.get(session_id)?;
        let filing = FilingComputation::compute(&record.session, &self.constants);
        record.session.filing = Some(filing.clone());
        record.touch();
        self.repository.update(record)?;

        info!(
            session_id = %session_id.0,
            agi = filing.agi,
            taxable_income = filing.taxable_income,
            net_result = filing.net_result,
            "filing computed"
        );
        Ok(filing)
    }

    /// Recompute, then run the rule catalog filtered by `scenario`.
    pub fn evaluate(
        &self,
        session_id: &SessionId,
        scenario: Option<Scenario>,
    ) -> Result<EvaluationReport, FilingServiceError> {
        let mut record = self.get(session_id)?;
        let evaluation = self.evaluate_session(&mut record.session, scenario);
        record.touch();
        self.repository.update(record)?;
        info!(
            session_id = %session_id.0,
            scenario = scenario.map(Scenario::tag).unwrap_or("all"),
            score = evaluation.report.summary.score,
            failed = evaluation.report.summary.failed,
            "session rules evaluated"
        );
        Ok(evaluation.report)
    }

    pub fn gaps(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<GapQuestionDescriptor>, FilingServiceError> {
        let record = self.get(session_id)?;
        Ok(self.gaps.select_questions(&record.session))
    }

    /// Full pass over a session that is not stored; the computation is cached on it.
    pub fn evaluate_session(
        &self,
        session: &mut TaxSession,
        scenario: Option<Scenario>,
    ) -> SessionEvaluation {
        let filing = FilingComputation::compute(session, &self.constants);
        session.filing = Some(filing.clone());
        let context = RuleContext::for_session(session, &self.constants);
        let report = self.engine.evaluate(&context, scenario);
        let gaps = self.gaps.select_questions(session);
        SessionEvaluation {
            filing,
            report,
            gaps,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilingServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Upload(#[from] UploadRejected),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("unknown gap question '{0}'")]
    UnknownQuestion(String),
}
