//! Presentation views over an [`EvaluationReport`] and CSV export.

use std::io::Write;

use serde::Serialize;

use super::rules::{EvaluationReport, RuleResult, RuleStage, VerdictStatus};

#[derive(Debug, Clone, Serialize)]
pub struct StageView {
    pub stage: RuleStage,
    pub stage_label: &'static str,
    pub passed: usize,
    pub failed: usize,
    pub warned: usize,
    pub skipped: usize,
    pub results: Vec<RuleResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub score_label: String,
    pub stages: Vec<StageView>,
    /// Failing and warning rules, failures first.
    pub attention: Vec<RuleResult>,
}

impl ReportView {
    pub fn from_report(report: &EvaluationReport) -> Self {
        let stages = report
            .by_stage()
            .into_iter()
            .map(|(stage, results)| {
                let count = |status: VerdictStatus| {
                    results
                        .iter()
                        .filter(|result| result.status == status)
                        .count()
                };
                StageView {
                    stage,
                    stage_label: stage.label(),
                    passed: count(VerdictStatus::Pass),
                    failed: count(VerdictStatus::Fail),
                    warned: count(VerdictStatus::Warn),
                    skipped: count(VerdictStatus::Skip),
                    results: results.into_iter().cloned().collect(),
                }
            })
            .collect();

        let attention = report
            .with_status(VerdictStatus::Fail)
            .chain(report.with_status(VerdictStatus::Warn))
            .cloned()
            .collect();

        Self {
            score_label: report.summary.score_label(),
            stages,
            attention,
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    name: &'a str,
    stage: &'static str,
    severity: &'static str,
    kind: &'static str,
    status: &'static str,
    current_value: &'a str,
    expected_value: &'a str,
    extracted: bool,
    citation: String,
    detail: &'a str,
}

/// Write one row per rule result, with a header row.
pub fn write_csv<W: Write>(report: &EvaluationReport, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for result in &report.results {
        csv_writer.serialize(CsvRow {
            id: result.id,
            name: result.name,
            stage: result.stage.label(),
            severity: result.severity.label(),
            kind: result.kind.label(),
            status: result.status.label(),
            current_value: &result.current_value,
            expected_value: &result.expected_value,
            extracted: result.extracted,
            citation: format!(
                "{} / {} {}",
                result.citation.section, result.citation.form, result.citation.line
            ),
            detail: &result.detail,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
