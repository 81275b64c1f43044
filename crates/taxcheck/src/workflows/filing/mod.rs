//! Tax session filing workflow: constants, bracket math, the filing computation, rule
//! evaluation, gap questions, and the session service with its HTTP router.
//!
//! The core (constants through gaps) is pure and synchronous; the session service layers
//! a repository and logging on top of it.

pub mod brackets;
pub mod computation;
pub mod constants;
pub mod domain;
pub mod gaps;
pub mod report;
pub mod repository;
pub mod router;
pub mod rules;
pub mod service;

#[cfg(test)]
mod tests;

pub use brackets::{compute_tax, marginal_rate};
pub use computation::{FilingComputation, StateComputation};
pub use constants::TaxConstants;
pub use domain::{
    DocumentId, FilingStatus, GapAnswer, IncomeDocument, IncomeRecord, SessionId, StateCode,
    TaxSession,
};
pub use gaps::{FollowUpKind, GapCatalog, GapQuestionDescriptor};
pub use report::{write_csv, ReportView, StageView};
pub use repository::{RepositoryError, SessionRecord, SessionRepository};
pub use router::filing_router;
pub use rules::{
    EvaluationReport, EvaluationSummary, RuleContext, RuleRegistry, RuleResult, RulesEngine,
    Scenario, Verdict, VerdictStatus,
};
pub use service::{
    ExtractionOutcome, ExtractionUpload, FilingDefaults, FilingService, FilingServiceError,
    IncomeUpsert, SessionDraft, SessionEvaluation,
};
