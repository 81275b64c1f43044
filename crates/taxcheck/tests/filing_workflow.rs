use taxcheck::workflows::extraction::parse_extraction_response;
use taxcheck::workflows::filing::{
    write_csv, DocumentId, FilingComputation, FilingStatus, GapCatalog, ReportView, RuleContext,
    RulesEngine, StateCode, TaxConstants, TaxSession, VerdictStatus,
};
use taxcheck::workflows::manual::ManualIncomeImporter;

const SHEET: &str = "\
document_id,doc_type,payer_name,amount,federal_withheld,state_withheld
w2-acme,W-2,Acme Corp,80000,9000,
";

const NEC_EXTRACTION: &str = r#"This is a 2025 Form 1099-NEC from Blog Media.

<extracted_data>
{
  "doc_type": "1099-NEC",
  "payer_name": "Blog Media",
  "nonemployee_compensation": 100000,
  "fed_income_tax_withheld": 0,
  "extraction_status": {"nonemployee_compensation": "extracted"}
}
</extracted_data>"#;

fn computed(mut session: TaxSession, constants: &TaxConstants) -> TaxSession {
    session.filing = Some(FilingComputation::compute(&session, constants));
    session
}

#[test]
fn manual_sheet_flows_through_computation_and_rules() {
    let constants = TaxConstants::standard();
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    let replaced = ManualIncomeImporter::from_reader(SHEET.as_bytes())
        .expect("sheet imports")
        .apply(&mut session);
    assert_eq!(replaced, 0);

    let session = computed(session, &constants);
    let filing = session.filing.clone().expect("filing computed");
    assert_eq!(filing.agi, 80_000.0);
    assert_eq!(filing.taxable_income, 65_000.0);
    assert_eq!(filing.federal_income_tax, 9_214.0);
    assert_eq!(filing.net_result, -214.0);
    assert!(!filing.is_refund());

    let engine = RulesEngine::default();
    let report = engine.evaluate(&RuleContext::for_session(&session, &constants), None);
    for id in ["w2-wages-total", "federal-tax-brackets", "net-result-balance"] {
        assert_eq!(
            report.result(id).map(|result| result.status),
            Some(VerdictStatus::Pass),
            "{id} should pass"
        );
    }
    assert!(report.summary.score <= 100);
    assert_eq!(report.summary.errored, 0);
}

#[test]
fn extracted_contractor_income_carries_self_employment_tax() {
    let constants = TaxConstants::standard();
    let extracted = parse_extraction_response(NEC_EXTRACTION).expect("extraction parses");
    let mut session = TaxSession::new(2025, FilingStatus::Single);
    session.upsert_income(extracted.into_income_record(DocumentId("nec-blog".to_string())));

    let session = computed(session, &constants);
    let filing = session.filing.clone().expect("filing computed");
    assert_eq!(filing.se_tax, 14_130.0);
    assert_eq!(filing.adjustments.se_deduction, 7_065.0);

    let report = RulesEngine::default().evaluate(&RuleContext::for_session(&session, &constants), None);
    assert_eq!(
        report.result("se-tax-amount").map(|result| result.status),
        Some(VerdictStatus::Pass)
    );
    assert_eq!(
        report.result("se-deduction-half").map(|result| result.status),
        Some(VerdictStatus::Pass)
    );

    let gaps = GapCatalog::standard().select_questions(&session);
    assert!(!gaps.is_empty(), "self-employed filers get follow-up questions");
}

#[test]
fn report_view_and_csv_export_cover_every_result() {
    let constants = TaxConstants::standard();
    let mut session = TaxSession::new(2025, FilingStatus::MarriedFilingJointly);
    session.state = Some(StateCode::California);
    ManualIncomeImporter::from_reader(SHEET.as_bytes())
        .expect("sheet imports")
        .apply(&mut session);
    let session = computed(session, &constants);

    let report = RulesEngine::default().evaluate(&RuleContext::for_session(&session, &constants), None);
    let view = ReportView::from_report(&report);
    let grouped: usize = view.stages.iter().map(|stage| stage.results.len()).sum();
    assert_eq!(grouped, report.results.len());
    assert_eq!(
        view.attention.len(),
        report.summary.failed + report.summary.warned
    );

    let mut buffer = Vec::new();
    write_csv(&report, &mut buffer).expect("csv written");
    let text = String::from_utf8(buffer).expect("utf-8 csv");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("id,name,stage,severity,kind,status,current_value,expected_value,extracted,citation,detail")
    );
    assert_eq!(lines.count(), report.results.len());
}
