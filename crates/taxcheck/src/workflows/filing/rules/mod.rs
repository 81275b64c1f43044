//! Independent compliance and savings checks over a tax session.
//!
//! Each rule is a [`RuleDescriptor`] holding a pure predicate. [`RulesEngine::evaluate`]
//! runs every applicable rule in isolation: a predicate that errors or panics turns into a
//! `skip` verdict flagged as errored, and every other rule still runs.

mod catalog;
mod registry;
mod support;
mod verdict;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, warn};

use super::computation::FilingComputation;
use super::constants::{FederalConstants, FederalTable, StateTable, TaxConstants};
use super::domain::TaxSession;

pub use registry::{
    Citation, RuleDescriptor, RuleKind, RulePredicate, RuleRegistry, RuleStage, Scenario,
    Severity,
};
pub use support::{approx_eq, money, percent};
pub use verdict::{EvaluationError, Verdict, VerdictStatus};

/// Read-only view handed to every predicate.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub session: &'a TaxSession,
    /// Current filing computation; `None` until the session has been computed.
    pub filing: Option<&'a FilingComputation>,
    pub federal: FederalTable,
    pub state: Option<StateTable>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        session: &'a TaxSession,
        filing: Option<&'a FilingComputation>,
        constants: &TaxConstants,
    ) -> Self {
        let (federal, state) =
            constants.lookup(session.tax_year, session.state, session.filing_status);
        Self {
            session,
            filing,
            federal,
            state,
        }
    }

    /// Context over the session's cached computation.
    pub fn for_session(session: &'a TaxSession, constants: &TaxConstants) -> Self {
        Self::new(session, session.filing.as_ref(), constants)
    }

    pub fn constants(&self) -> &'static FederalConstants {
        self.federal.constants
    }
}

/// One rule's verdict joined with its descriptor metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub id: &'static str,
    pub name: &'static str,
    pub stage: RuleStage,
    pub severity: Severity,
    pub kind: RuleKind,
    pub citation: Citation,
    pub status: VerdictStatus,
    pub current_value: String,
    pub expected_value: String,
    pub extracted: bool,
    pub detail: String,
    /// True when the predicate failed internally and the verdict was downgraded to skip.
    pub errored: bool,
}

impl RuleResult {
    fn from_verdict(rule: &RuleDescriptor, verdict: Verdict, errored: bool) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            stage: rule.stage,
            severity: rule.severity,
            kind: rule.kind,
            citation: rule.citation,
            status: verdict.status,
            current_value: verdict.current_value,
            expected_value: verdict.expected_value,
            extracted: verdict.extracted,
            detail: verdict.detail,
            errored,
        }
    }
}

/// Counts and the 0-100 completeness score over non-skipped verdicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warned: usize,
    pub skipped: usize,
    pub errored: usize,
    /// Verdicts that contribute to the score (everything except skips).
    pub scored_count: usize,
    pub score: u8,
}

impl EvaluationSummary {
    pub fn from_results(results: &[RuleResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        let mut points = 0.0;
        for result in results {
            match result.status {
                VerdictStatus::Pass => summary.passed += 1,
                VerdictStatus::Fail => summary.failed += 1,
                VerdictStatus::Warn => summary.warned += 1,
                VerdictStatus::Skip => summary.skipped += 1,
            }
            if result.errored {
                summary.errored += 1;
            }
            if let Some(earned) = result.status.points() {
                summary.scored_count += 1;
                points += earned;
            }
        }
        if summary.scored_count > 0 {
            summary.score = (points / summary.scored_count as f64 * 100.0).round() as u8;
        }
        summary
    }

    /// False when every verdict was a skip; the score then carries no signal.
    pub fn evaluated(&self) -> bool {
        self.scored_count > 0
    }

    pub fn score_label(&self) -> String {
        if self.evaluated() {
            format!("{}%", self.score)
        } else {
            "not yet evaluated".to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub scenario: Option<Scenario>,
    pub results: Vec<RuleResult>,
    pub summary: EvaluationSummary,
}

impl EvaluationReport {
    pub fn result(&self, id: &str) -> Option<&RuleResult> {
        self.results.iter().find(|result| result.id == id)
    }

    /// Results grouped by stage in presentation order; empty stages are omitted.
    pub fn by_stage(&self) -> Vec<(RuleStage, Vec<&RuleResult>)> {
        RuleStage::ordered()
            .into_iter()
            .map(|stage| {
                let results = self
                    .results
                    .iter()
                    .filter(|result| result.stage == stage)
                    .collect::<Vec<_>>();
                (stage, results)
            })
            .filter(|(_, results)| !results.is_empty())
            .collect()
    }

    pub fn with_status(&self, status: VerdictStatus) -> impl Iterator<Item = &RuleResult> {
        self.results
            .iter()
            .filter(move |result| result.status == status)
    }
}

/// Runs a [`RuleRegistry`] against rule contexts.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    registry: RuleRegistry,
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new(RuleRegistry::standard())
    }
}

impl RulesEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Evaluate every rule whose scenario tags include `scenario` (all rules when `None`).
    /// Registry order is preserved in the output.
    pub fn evaluate(&self, context: &RuleContext<'_>, scenario: Option<Scenario>) -> EvaluationReport {
        let results = self
            .registry
            .rules()
            .iter()
            .filter(|rule| rule.applies_to(scenario))
            .map(|rule| run_rule(rule, context))
            .collect::<Vec<_>>();

        let summary = EvaluationSummary::from_results(&results);
        debug!(
            scenario = scenario.map(Scenario::tag).unwrap_or("all"),
            total = summary.total,
            failed = summary.failed,
            errored = summary.errored,
            score = summary.score,
            "rules evaluated"
        );

        EvaluationReport {
            scenario,
            results,
            summary,
        }
    }
}

fn run_rule(rule: &RuleDescriptor, context: &RuleContext<'_>) -> RuleResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (rule.check)(context)))
        .unwrap_or_else(|payload| Err(EvaluationError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(verdict) => RuleResult::from_verdict(rule, verdict, false),
        Err(error) => {
            warn!(rule = rule.id, error = %error, "rule evaluation errored; recording skip");
            let verdict = Verdict::skip(format!("evaluation error: {error}"));
            RuleResult::from_verdict(rule, verdict, true)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
