//! Spreadsheet entry of income documents the filer keys in by hand.

mod parser;

use std::io::Read;
use std::path::Path;

use crate::workflows::filing::domain::{IncomeRecord, TaxSession};

pub use parser::ManualRow;

#[derive(Debug)]
pub enum ManualImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for ManualImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManualImportError::Io(err) => write!(f, "failed to read income sheet: {}", err),
            ManualImportError::Csv(err) => write!(f, "invalid income CSV data: {}", err),
            ManualImportError::InvalidRow { line, reason } => {
                write!(f, "income sheet row {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for ManualImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManualImportError::Io(err) => Some(err),
            ManualImportError::Csv(err) => Some(err),
            ManualImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for ManualImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ManualImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Parsed manual rows, ready to be applied to a session.
#[derive(Debug, Clone, Default)]
pub struct ManualIncomeImporter {
    records: Vec<IncomeRecord>,
}

impl ManualIncomeImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ManualImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ManualImportError> {
        let records = parser::parse_rows(reader)?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[IncomeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<IncomeRecord> {
        self.records
    }

    /// Upserts every row into the session; returns how many replaced an existing document.
    pub fn apply(self, session: &mut TaxSession) -> usize {
        self.records
            .into_iter()
            .map(|record| session.upsert_income(record))
            .filter(|replaced| *replaced)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::filing::domain::{
        DocumentId, DocumentType, FilingStatus, IncomeDocument, RecordSource,
    };

    const SHEET: &str = "\
document_id,doc_type,payer_name,amount,federal_withheld,state_withheld
w2-acme, W-2 ,Acme Corp,80000,9000,3100
nec-blog,1099-NEC,Blog Media,12000,,
int-bank,1099-INT,First Bank,412.50,,
";

    #[test]
    fn maps_amounts_onto_primary_fields() {
        let importer = ManualIncomeImporter::from_reader(SHEET.as_bytes()).expect("import");
        let records = importer.records();
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|record| record.source == RecordSource::Manual));

        match &records[0].document {
            IncomeDocument::W2(form) => {
                assert_eq!(form.employer_name.as_deref(), Some("Acme Corp"));
                assert_eq!(form.wages, Some(80_000.0));
                assert_eq!(form.fed_income_tax_withheld, Some(9_000.0));
                assert_eq!(form.state_income_tax_withheld, Some(3_100.0));
            }
            other => panic!("expected W-2, got {other:?}"),
        }
        assert_eq!(records[1].doc_type(), DocumentType::Form1099Nec);
        assert_eq!(records[1].document.federal_withholding(), 0.0);
        assert_eq!(records[2].document.primary_amount(), 412.5);
    }

    #[test]
    fn rejects_unknown_types_with_line_number() {
        let sheet = "document_id,doc_type,payer_name,amount,federal_withheld,state_withheld\n\
ok,1098,Lender,9000,,\n\
bad,1099-R,Pension Co,100,,\n";
        match ManualIncomeImporter::from_reader(sheet.as_bytes()) {
            Err(ManualImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("1099-R"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn state_withholding_only_on_state_bearing_forms() {
        let sheet = "document_id,doc_type,payer_name,amount,federal_withheld,state_withheld\n\
div,1099-DIV,Broker,500,,25\n";
        assert!(matches!(
            ManualIncomeImporter::from_reader(sheet.as_bytes()),
            Err(ManualImportError::InvalidRow { line: 2, .. })
        ));
    }

    #[test]
    fn apply_replaces_by_document_id() {
        let mut session = TaxSession::new(2025, FilingStatus::Single);
        ManualIncomeImporter::from_reader(SHEET.as_bytes())
            .expect("import")
            .apply(&mut session);
        let update = "document_id,doc_type,payer_name,amount,federal_withheld,state_withheld\n\
w2-acme,W-2,Acme Corp,81000,9100,\n";
        let replaced = ManualIncomeImporter::from_reader(update.as_bytes())
            .expect("import")
            .apply(&mut session);

        assert_eq!(replaced, 1);
        assert_eq!(session.incomes.len(), 3);
        let wages = session
            .incomes
            .iter()
            .find(|record| record.document_id == DocumentId("w2-acme".to_string()))
            .map(|record| record.document.primary_amount());
        assert_eq!(wages, Some(81_000.0));
    }
}
