use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::ManualImportError;
use crate::workflows::filing::domain::{
    DocumentId, DocumentType, Form1098, Form1098E, Form1098T, Form1099B, Form1099Div,
    Form1099Int, Form1099Nec, IncomeDocument, IncomeRecord, RecordSource, W2,
};

/// One spreadsheet row. Blank cells deserialize as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualRow {
    pub document_id: String,
    pub doc_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub federal_withheld: Option<f64>,
    #[serde(default)]
    pub state_withheld: Option<f64>,
}

impl ManualRow {
    fn into_record(self) -> Result<IncomeRecord, String> {
        if self.document_id.trim().is_empty() {
            return Err("document_id is required".to_string());
        }
        let doc_type = self.doc_type.parse::<DocumentType>()?;
        let amount = self
            .amount
            .ok_or_else(|| format!("amount is required for {}", doc_type.label()))?;
        let name = self.payer_name;
        let federal = self.federal_withheld;
        let state = self.state_withheld;
        let no_state = |document: IncomeDocument| match state {
            Some(value) if value != 0.0 => Err(format!(
                "{} does not carry state withholding",
                doc_type.label()
            )),
            _ => Ok(document),
        };

        let document = match doc_type {
            DocumentType::W2 => IncomeDocument::W2(W2 {
                employer_name: name,
                wages: Some(amount),
                fed_income_tax_withheld: federal,
                state_income_tax_withheld: state,
                ..W2::default()
            }),
            DocumentType::Form1099Nec => IncomeDocument::Form1099Nec(Form1099Nec {
                payer_name: name,
                nonemployee_compensation: Some(amount),
                fed_income_tax_withheld: federal,
                state_tax_withheld: state,
                ..Form1099Nec::default()
            }),
            DocumentType::Form1099Int => no_state(IncomeDocument::Form1099Int(Form1099Int {
                payer_name: name,
                interest_income: Some(amount),
                fed_income_tax_withheld: federal,
            }))?,
            DocumentType::Form1099Div => no_state(IncomeDocument::Form1099Div(Form1099Div {
                payer_name: name,
                ordinary_dividends: Some(amount),
                fed_income_tax_withheld: federal,
                ..Form1099Div::default()
            }))?,
            DocumentType::Form1099B => no_state(IncomeDocument::Form1099B(Form1099B {
                payer_name: name,
                gain_loss: Some(amount),
                fed_income_tax_withheld: federal,
                ..Form1099B::default()
            }))?,
            DocumentType::Form1098 => no_state(IncomeDocument::Form1098(Form1098 {
                lender_name: name,
                mortgage_interest: Some(amount),
                ..Form1098::default()
            }))?,
            DocumentType::Form1098T => no_state(IncomeDocument::Form1098T(Form1098T {
                institution_name: name,
                amounts_billed: Some(amount),
                ..Form1098T::default()
            }))?,
            DocumentType::Form1098E => no_state(IncomeDocument::Form1098E(Form1098E {
                lender_name: name,
                student_loan_interest: Some(amount),
            }))?,
            DocumentType::Unknown => {
                return Err("unknown documents cannot be entered manually".to_string())
            }
        };

        Ok(IncomeRecord {
            document_id: DocumentId(self.document_id.trim().to_string()),
            source: RecordSource::Manual,
            document,
            extraction_status: BTreeMap::new(),
        })
    }
}

pub(super) fn parse_rows<R: Read>(reader: R) -> Result<Vec<IncomeRecord>, ManualImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        let line = row.position().map(|position| position.line()).unwrap_or(0);
        let parsed = row.deserialize::<ManualRow>(Some(&headers))?;
        let record = parsed
            .into_record()
            .map_err(|reason| ManualImportError::InvalidRow { line, reason })?;
        records.push(record);
    }

    Ok(records)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
