use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Pass,
    Fail,
    Warn,
    Skip,
}

impl VerdictStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::Warn => "Warning",
            Self::Skip => "Skipped",
        }
    }

    /// Contribution to the score; `None` for verdicts excluded from scoring.
    pub const fn points(self) -> Option<f64> {
        match self {
            Self::Pass => Some(1.0),
            Self::Warn => Some(0.5),
            Self::Fail => Some(0.0),
            Self::Skip => None,
        }
    }
}

/// Outcome of one rule evaluation. Values are display-formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub current_value: String,
    pub expected_value: String,
    /// True when the inputs behind the check were read by extraction (or entered manually).
    pub extracted: bool,
    pub detail: String,
}

impl Verdict {
    fn new(
        status: VerdictStatus,
        current_value: impl Into<String>,
        expected_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            current_value: current_value.into(),
            expected_value: expected_value.into(),
            extracted: true,
            detail: detail.into(),
        }
    }

    pub fn pass(
        current_value: impl Into<String>,
        expected_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(VerdictStatus::Pass, current_value, expected_value, detail)
    }

    pub fn fail(
        current_value: impl Into<String>,
        expected_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(VerdictStatus::Fail, current_value, expected_value, detail)
    }

    pub fn warn(
        current_value: impl Into<String>,
        expected_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(VerdictStatus::Warn, current_value, expected_value, detail)
    }

    /// A precondition was absent; nothing to check.
    pub fn skip(detail: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Skip,
            current_value: String::new(),
            expected_value: String::new(),
            extracted: false,
            detail: detail.into(),
        }
    }

    pub fn with_status(
        status: VerdictStatus,
        current_value: impl Into<String>,
        expected_value: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(status, current_value, expected_value, detail)
    }

    pub fn extracted(mut self, extracted: bool) -> Self {
        self.extracted = extracted;
        self
    }
}

/// Failure inside a rule predicate. The engine downgrades these to `skip`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("check panicked: {0}")]
    Panicked(String),
}
