//! Follow-up interview questions for information the documents cannot reveal.

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::debug;

use super::domain::{DocumentType, StateCode, TaxSession};
use super::rules::EvaluationError;

/// Shape of the answer a question asks for; the selector never validates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpKind {
    Amount,
    Upload,
    YesNo,
    AmountOrUpload,
}

impl FollowUpKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Amount => "Enter an amount",
            Self::Upload => "Upload a document",
            Self::YesNo => "Yes or no",
            Self::AmountOrUpload => "Enter an amount or upload a document",
        }
    }
}

pub type GapPredicate = fn(&TaxSession) -> Result<bool, EvaluationError>;

#[derive(Clone, Copy, Serialize)]
pub struct GapQuestionDescriptor {
    pub id: &'static str,
    pub question: &'static str,
    pub hint: &'static str,
    pub follow_up: FollowUpKind,
    #[serde(skip)]
    pub applies: GapPredicate,
}

impl std::fmt::Debug for GapQuestionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GapQuestionDescriptor")
            .field("id", &self.id)
            .field("follow_up", &self.follow_up)
            .finish_non_exhaustive()
    }
}

/// Ordered question table. Declaration order is the presentation order.
#[derive(Debug, Clone)]
pub struct GapCatalog {
    questions: Vec<GapQuestionDescriptor>,
}

impl Default for GapCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl GapCatalog {
    pub fn with_questions(questions: Vec<GapQuestionDescriptor>) -> Self {
        Self { questions }
    }

    pub fn questions(&self) -> &[GapQuestionDescriptor] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&GapQuestionDescriptor> {
        self.questions.iter().find(|question| question.id == id)
    }

    /// Unanswered questions whose predicate holds. A predicate that errors or panics
    /// counts as not applicable.
    pub fn select_questions(&self, session: &TaxSession) -> Vec<GapQuestionDescriptor> {
        self.questions
            .iter()
            .filter(|question| !session.answered(question.id))
            .filter(|question| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| (question.applies)(session)));
                match outcome {
                    Ok(Ok(applies)) => applies,
                    Ok(Err(error)) => {
                        debug!(question = question.id, %error, "gap predicate failed; excluding");
                        false
                    }
                    Err(_) => {
                        debug!(question = question.id, "gap predicate panicked; excluding");
                        false
                    }
                }
            })
            .copied()
            .collect()
    }

    pub fn standard() -> Self {
        Self::with_questions(vec![
            GapQuestionDescriptor {
                id: "has401k",
                question: "Did you contribute to a 401(k) or 403(b) through work?",
                hint: "Box 12 code D on your W-2 shows elective deferrals.",
                follow_up: FollowUpKind::Amount,
                applies: has_wages,
            },
            GapQuestionDescriptor {
                id: "hasIraContribution",
                question: "Did you contribute to a traditional IRA for this tax year?",
                hint: "Contributions made up to the filing deadline count for the prior year.",
                follow_up: FollowUpKind::Amount,
                applies: ira_unreported,
            },
            GapQuestionDescriptor {
                id: "hasHsa",
                question: "Are you covered by a high-deductible health plan with an HSA?",
                hint: "Form 5498-SA reports your HSA contributions.",
                follow_up: FollowUpKind::AmountOrUpload,
                applies: hsa_unreported,
            },
            GapQuestionDescriptor {
                id: "hasStudentLoans",
                question: "Did you pay interest on student loans?",
                hint: "Your loan servicer issues Form 1098-E when interest exceeds $600.",
                follow_up: FollowUpKind::AmountOrUpload,
                applies: student_loans_unreported,
            },
            GapQuestionDescriptor {
                id: "hasMortgage",
                question: "Do you pay mortgage interest on your home?",
                hint: "Your lender sends Form 1098 each January.",
                follow_up: FollowUpKind::Upload,
                applies: mortgage_unreported,
            },
            GapQuestionDescriptor {
                id: "hasCharitable",
                question: "Did you make charitable donations?",
                hint: "Only matters if you itemize; keep receipts for gifts of $250 or more.",
                follow_up: FollowUpKind::Amount,
                applies: charitable_unreported,
            },
            GapQuestionDescriptor {
                id: "isEducator",
                question: "Are you a K-12 teacher, instructor, counselor, or aide?",
                hint: "Eligible educators can deduct classroom expenses.",
                follow_up: FollowUpKind::Amount,
                applies: has_wages,
            },
            GapQuestionDescriptor {
                id: "hasHomeOffice",
                question: "Do you use part of your home regularly and exclusively for your business?",
                hint: "The simplified method allows $5 per square foot up to 300 sq ft.",
                follow_up: FollowUpKind::Amount,
                applies: has_self_employment,
            },
            GapQuestionDescriptor {
                id: "hasBusinessMileage",
                question: "Did you drive your own vehicle for business?",
                hint: "Commuting miles do not count.",
                follow_up: FollowUpKind::Amount,
                applies: has_self_employment,
            },
            GapQuestionDescriptor {
                id: "hasSeHealthInsurance",
                question: "Did you pay for your own health insurance while self-employed?",
                hint: "Premiums for months you could join an employer plan do not qualify.",
                follow_up: FollowUpKind::Amount,
                applies: has_self_employment,
            },
            GapQuestionDescriptor {
                id: "paidEstimatedTaxes",
                question: "Did you make estimated tax payments this year?",
                hint: "Include all four quarterly Form 1040-ES payments.",
                follow_up: FollowUpKind::Amount,
                applies: estimated_payments_likely,
            },
            GapQuestionDescriptor {
                id: "hasChildcare",
                question: "Did you pay for childcare so you could work?",
                hint: "Care for children under 13 qualifies for the dependent care credit.",
                follow_up: FollowUpKind::Amount,
                applies: has_dependents,
            },
            GapQuestionDescriptor {
                id: "boughtEv",
                question: "Did you buy a new electric or plug-in hybrid vehicle?",
                hint: "The dealer provides a clean vehicle seller report.",
                follow_up: FollowUpKind::YesNo,
                applies: ev_not_flagged,
            },
            GapQuestionDescriptor {
                id: "hasOtherIncome",
                question: "Did you have income not shown on any uploaded form?",
                hint: "Examples: cash tips, prizes, or rental income.",
                follow_up: FollowUpKind::Amount,
                applies: always,
            },
            GapQuestionDescriptor {
                id: "isRenter",
                question: "Did you rent your home in California for at least half the year?",
                hint: "California renters under the income limit can claim a renter's credit.",
                follow_up: FollowUpKind::YesNo,
                applies: california_resident,
            },
        ])
    }
}

fn always(_session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(true)
}

fn has_wages(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(session.has_document(DocumentType::W2))
}

fn has_self_employment(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(session.has_document(DocumentType::Form1099Nec))
}

fn ira_unreported(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(session.manual.retirement_contributions <= 0.0)
}

fn hsa_unreported(session: &TaxSession) -> Result<bool, EvaluationError> {
    let employer_hsa = session
        .w2s()
        .any(|(_, form)| form.box12_total(&["W"]) > 0.0);
    Ok(!employer_hsa && session.manual.hsa_contributions <= 0.0)
}

fn student_loans_unreported(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(!session.has_document(DocumentType::Form1098E)
        && session.manual.student_loan_interest <= 0.0)
}

fn mortgage_unreported(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(!session.has_document(DocumentType::Form1098) && session.manual.mortgage_interest <= 0.0)
}

fn charitable_unreported(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(session.manual.charitable_contributions <= 0.0)
}

fn estimated_payments_likely(session: &TaxSession) -> Result<bool, EvaluationError> {
    let untaxed = [
        DocumentType::Form1099Nec,
        DocumentType::Form1099Int,
        DocumentType::Form1099Div,
        DocumentType::Form1099B,
    ];
    Ok(session.manual.estimated_payments <= 0.0
        && untaxed
            .into_iter()
            .any(|doc_type| session.has_document(doc_type)))
}

fn has_dependents(session: &TaxSession) -> Result<bool, EvaluationError> {
    let dependents = &session.dependents;
    Ok(dependents.children_under_17 > 0 || dependents.childcare_dependents > 0)
}

fn ev_not_flagged(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(!session.manual.ev_purchase)
}

fn california_resident(session: &TaxSession) -> Result<bool, EvaluationError> {
    Ok(session.state == Some(StateCode::California) && !session.manual.is_renter)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn question_ids_are_unique() {
        let catalog = GapCatalog::standard();
        let ids = catalog
            .questions()
            .iter()
            .map(|question| question.id)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), catalog.questions().len());
    }
}
