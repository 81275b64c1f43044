use crate::infra::{load_session, parse_scenario, InMemorySessionRepository};
use crate::routes::SessionService;
use clap::Args;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use taxcheck::error::AppError;
use taxcheck::workflows::filing::rules::money;
use taxcheck::workflows::filing::{
    write_csv, EvaluationReport, ExtractionUpload, FilingComputation, FilingDefaults,
    FilingStatus, GapAnswer, GapQuestionDescriptor, ReportView, Scenario, SessionDraft,
    StateCode, TaxSession,
};
use taxcheck::workflows::manual::ManualIncomeImporter;

const SAMPLE_SHEET: &str = "\
document_id,doc_type,payer_name,amount,federal_withheld,state_withheld
w2-acme,W-2,Acme Corp,80000,9000,
";

const SAMPLE_INTEREST_EXTRACTION: &str = "This is a 2025 Form 1099-INT from First Bank.\n\n\
The interest amount in box 1 was clearly legible.\n\n\
<extracted_data>{\"doc_type\": \"1099-INT\", \"payer_name\": \"First Bank\", \
\"interest_income\": 412.50, \"fed_income_tax_withheld\": 0, \
\"extraction_status\": {\"interest_income\": \"extracted\",}}</extracted_data>";

#[derive(Args, Debug)]
pub(crate) struct SessionArgs {
    /// Session JSON file (the same shape the HTTP API accepts)
    #[arg(long)]
    pub(crate) session: PathBuf,
    /// Optional manual income CSV merged into the session before it is processed
    #[arg(long)]
    pub(crate) manual: Option<PathBuf>,
    /// Print the raw JSON payload instead of the text rendering
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    #[command(flatten)]
    pub(crate) session: SessionArgs,
    /// Only run rules tagged with this scenario (fed-w2, ca-1099, ...)
    #[arg(long, value_parser = parse_scenario)]
    pub(crate) scenario: Option<Scenario>,
    /// Write one CSV row per rule result to this path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Resident state for the sample filer (CA or NY)
    #[arg(long, value_parser = parse_state)]
    pub(crate) state: Option<StateCode>,
    /// Restrict the rule report to one scenario
    #[arg(long, value_parser = parse_scenario)]
    pub(crate) scenario: Option<Scenario>,
}

fn parse_state(raw: &str) -> Result<StateCode, String> {
    raw.parse::<StateCode>()
}

fn stateless_service() -> SessionService {
    SessionService::new(
        Arc::new(InMemorySessionRepository::default()),
        FilingDefaults::default(),
    )
}

/// Single 2025 filer with one $80,000 W-2 and $9,000 withheld.
pub(crate) fn sample_session() -> TaxSession {
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    if let Ok(importer) = ManualIncomeImporter::from_reader(SAMPLE_SHEET.as_bytes()) {
        importer.apply(&mut session);
    }
    session
}

pub(crate) fn run_compute(args: SessionArgs) -> Result<(), AppError> {
    let session = load_session(&args.session, args.manual.as_deref())?;
    let service = stateless_service();
    let filing = FilingComputation::compute(&session, service.constants());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&filing)?);
    } else {
        render_filing(&filing);
    }
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        session,
        scenario,
        csv,
    } = args;
    let mut tax_session = load_session(&session.session, session.manual.as_deref())?;
    let evaluation = stateless_service().evaluate_session(&mut tax_session, scenario);

    if let Some(path) = csv {
        write_csv(&evaluation.report, File::create(&path)?)?;
        eprintln!(
            "wrote {} rule results to {}",
            evaluation.report.results.len(),
            path.display()
        );
    }

    if session.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        render_filing(&evaluation.filing);
        render_report(&evaluation.report, scenario);
    }
    Ok(())
}

pub(crate) fn run_gaps(args: SessionArgs) -> Result<(), AppError> {
    let mut session = load_session(&args.session, args.manual.as_deref())?;
    let evaluation = stateless_service().evaluate_session(&mut session, None);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation.gaps)?);
    } else {
        render_gaps(&evaluation.gaps);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { state, scenario } = args;
    let service = stateless_service();

    println!("Tax estimator demo (estimates only, not tax advice)");
    let record = service.create(SessionDraft {
        tax_year: Some(2025),
        state,
        ..SessionDraft::default()
    })?;
    let session_id = record.session_id.clone();
    println!(
        "- Opened session {} for a {} filer, tax year {}{}",
        session_id.0,
        record.session.filing_status.label(),
        record.session.tax_year,
        state
            .map(|code| format!(", resident of {}", code.label()))
            .unwrap_or_default()
    );

    let importer = ManualIncomeImporter::from_reader(SAMPLE_SHEET.as_bytes())?;
    for income in importer.into_records() {
        let upsert = service.upsert_income(&session_id, income)?;
        println!("- Entered {} by hand", upsert.document_id.0);
    }

    let outcome = service.ingest_extraction(
        &session_id,
        ExtractionUpload {
            document_id: None,
            file_name: "first-bank-1099-int.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 48_213,
            response: SAMPLE_INTEREST_EXTRACTION.to_string(),
        },
    )?;
    println!(
        "- Uploaded {} ({} income records on file)",
        outcome.upsert.document_id.0, outcome.upsert.income_count
    );
    for paragraph in &outcome.narrative {
        println!("  > {paragraph}");
    }
    if !outcome.missing_fields.is_empty() {
        println!("  Fields not read: {}", outcome.missing_fields.join(", "));
    }

    println!();
    render_filing(&service.compute(&session_id)?);
    let report = service.evaluate(&session_id, scenario)?;
    render_report(&report, scenario);

    let gaps = service.gaps(&session_id)?;
    if let Some(first) = gaps.first() {
        println!("\nAnswering '{}' with no", first.question);
        service.record_gap_answer(&session_id, first.id, GapAnswer::Flag(false))?;
        render_gaps(&service.gaps(&session_id)?);
    } else {
        render_gaps(&gaps);
    }

    Ok(())
}

fn render_filing(filing: &FilingComputation) {
    println!(
        "Federal estimate for {} ({})",
        filing.tax_year,
        filing.filing_status.label()
    );
    println!(
        "- Total income {} | adjustments {} | AGI {}",
        money(filing.income.total),
        money(filing.adjustments.total),
        money(filing.agi)
    );
    println!(
        "- Deduction {} | taxable income {}",
        money(filing.deduction),
        money(filing.taxable_income)
    );
    println!(
        "- Income tax {} | credits {} | self-employment tax {} | total tax {}",
        money(filing.federal_income_tax),
        money(filing.credits.total),
        money(filing.se_tax),
        money(filing.total_tax)
    );
    println!(
        "- Withheld {} -> {} {}",
        money(filing.total_withheld),
        if filing.is_refund() { "refund" } else { "owed" },
        money(filing.net_result.abs())
    );
    if let Some(state) = &filing.state {
        println!(
            "- {} tax {} on taxable income {} | withheld {} -> net {}",
            state.state.label(),
            money(state.total_tax),
            money(state.taxable_income),
            money(state.withheld),
            money(state.net_result)
        );
    }
}

fn render_report(report: &EvaluationReport, scenario: Option<Scenario>) {
    let view = ReportView::from_report(report);
    let summary = &report.summary;
    println!(
        "\nRule check ({}): score {} | {} passed, {} failed, {} warnings, {} skipped",
        scenario.map(Scenario::tag).unwrap_or("all scenarios"),
        view.score_label,
        summary.passed,
        summary.failed,
        summary.warned,
        summary.skipped
    );
    for stage in &view.stages {
        println!(
            "  - {}: {} pass / {} fail / {} warn / {} skip",
            stage.stage_label, stage.passed, stage.failed, stage.warned, stage.skipped
        );
    }
    if !view.attention.is_empty() {
        println!("Needs attention:");
        for result in &view.attention {
            println!(
                "  - [{}] {}: {} (expected {})",
                result.status.label(),
                result.name,
                result.current_value,
                result.expected_value
            );
        }
    }
}

fn render_gaps(gaps: &[GapQuestionDescriptor]) {
    if gaps.is_empty() {
        println!("\nNo open follow-up questions");
        return;
    }
    println!("\nOpen follow-up questions:");
    for question in gaps {
        println!("{}", gap_line(question));
    }
}

fn gap_line(question: &GapQuestionDescriptor) -> String {
    format!(
        "  - {} [{}] ({})",
        question.question,
        question.follow_up.label(),
        question.hint
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxcheck::workflows::extraction::parse_extraction_response;

    #[test]
    fn sample_session_matches_known_balance() {
        let session = sample_session();
        let service = stateless_service();
        let filing = FilingComputation::compute(&session, service.constants());
        assert_eq!(filing.taxable_income, 65_000.0);
        assert_eq!(filing.net_result, -214.0);
    }

    #[test]
    fn sample_extraction_parses_despite_trailing_comma() {
        let extracted =
            parse_extraction_response(SAMPLE_INTEREST_EXTRACTION).expect("sample parses");
        assert_eq!(extracted.document.primary_amount(), 412.5);
    }

    #[test]
    fn gap_lines_name_the_expected_answer() {
        let mut session = sample_session();
        let gaps = stateless_service().evaluate_session(&mut session, None).gaps;
        let question = gaps.first().expect("sample session has open questions");
        let line = gap_line(question);
        assert!(line.contains(question.question));
        assert!(line.contains(question.follow_up.label()));
    }

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs {
            state: Some(StateCode::California),
            scenario: None,
        })
        .expect("demo completes");
    }
}
