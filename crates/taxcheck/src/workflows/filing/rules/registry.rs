use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::super::domain::{DocumentType, StateCode, TaxSession};
use super::verdict::{EvaluationError, Verdict};
use super::RuleContext;

/// Filer-profile label used to select which rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "fed-w2")]
    FedW2,
    #[serde(rename = "fed-1099")]
    Fed1099,
    #[serde(rename = "fed-investments")]
    FedInvestments,
    #[serde(rename = "ca-w2")]
    CaW2,
    #[serde(rename = "ca-1099")]
    Ca1099,
    #[serde(rename = "ny-w2")]
    NyW2,
    #[serde(rename = "ny-1099")]
    Ny1099,
}

impl Scenario {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::FedW2,
            Self::Fed1099,
            Self::FedInvestments,
            Self::CaW2,
            Self::Ca1099,
            Self::NyW2,
            Self::Ny1099,
        ]
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::FedW2 => "fed-w2",
            Self::Fed1099 => "fed-1099",
            Self::FedInvestments => "fed-investments",
            Self::CaW2 => "ca-w2",
            Self::Ca1099 => "ca-1099",
            Self::NyW2 => "ny-w2",
            Self::Ny1099 => "ny-1099",
        }
    }

    /// Scenario tags describing the filer profile implied by the session's documents.
    pub fn profile(session: &TaxSession) -> Vec<Self> {
        let has_w2 = session.has_document(DocumentType::W2);
        let has_nec = session.has_document(DocumentType::Form1099Nec);
        let has_investments = [
            DocumentType::Form1099Int,
            DocumentType::Form1099Div,
            DocumentType::Form1099B,
        ]
        .into_iter()
        .any(|doc_type| session.has_document(doc_type));

        let mut scenarios = Vec::new();
        if has_w2 {
            scenarios.push(Self::FedW2);
        }
        if has_nec {
            scenarios.push(Self::Fed1099);
        }
        if has_investments {
            scenarios.push(Self::FedInvestments);
        }
        match session.state {
            Some(StateCode::California) => {
                if has_w2 {
                    scenarios.push(Self::CaW2);
                }
                if has_nec {
                    scenarios.push(Self::Ca1099);
                }
            }
            Some(StateCode::NewYork) => {
                if has_w2 {
                    scenarios.push(Self::NyW2);
                }
                if has_nec {
                    scenarios.push(Self::Ny1099);
                }
            }
            None => {}
        }
        scenarios
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|scenario| scenario.tag() == normalized)
            .ok_or_else(|| format!("unknown scenario '{value}'"))
    }
}

/// Presentation grouping; evaluation order does not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStage {
    IncomeReporting,
    Adjustments,
    Deductions,
    Credits,
    Computation,
    Optimization,
}

impl RuleStage {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::IncomeReporting,
            Self::Adjustments,
            Self::Deductions,
            Self::Credits,
            Self::Computation,
            Self::Optimization,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IncomeReporting => "Income Reporting",
            Self::Adjustments => "Adjustments",
            Self::Deductions => "Deductions",
            Self::Credits => "Credits",
            Self::Computation => "Computation",
            Self::Optimization => "Optimization",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Compliance,
    Savings,
}

impl RuleKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Compliance => "Compliance",
            Self::Savings => "Savings",
        }
    }
}

/// Descriptive legal/form reference; never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub section: &'static str,
    pub form: &'static str,
    pub line: &'static str,
}

impl Citation {
    pub const fn new(section: &'static str, form: &'static str, line: &'static str) -> Self {
        Self {
            section,
            form,
            line,
        }
    }
}

pub type RulePredicate = fn(&RuleContext<'_>) -> Result<Verdict, EvaluationError>;

/// Static descriptor for one independent compliance or savings check.
#[derive(Clone, Copy)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub citation: Citation,
    pub scenarios: &'static [Scenario],
    pub stage: RuleStage,
    pub severity: Severity,
    pub kind: RuleKind,
    pub check: RulePredicate,
}

impl RuleDescriptor {
    pub fn applies_to(&self, scenario: Option<Scenario>) -> bool {
        match scenario {
            Some(scenario) => self.scenarios.contains(&scenario),
            None => true,
        }
    }
}

impl fmt::Debug for RuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("severity", &self.severity)
            .field("kind", &self.kind)
            .field("scenarios", &self.scenarios)
            .finish_non_exhaustive()
    }
}

/// Immutable rule table handed to the engine.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<RuleDescriptor>,
}

impl RuleRegistry {
    pub fn standard() -> Self {
        Self::with_rules(super::catalog::standard_rules())
    }

    pub fn with_rules(rules: Vec<RuleDescriptor>) -> Self {
        Self { rules }
    }

    pub fn with_rule(mut self, rule: RuleDescriptor) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[RuleDescriptor] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&RuleDescriptor> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn for_stage(&self, stage: RuleStage) -> Vec<&RuleDescriptor> {
        self.rules.iter().filter(|rule| rule.stage == stage).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
