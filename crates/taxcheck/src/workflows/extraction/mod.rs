//! Parsing of document-extraction responses and upload admission.
//!
//! The extraction collaborator replies with a few paragraphs of narration followed by an
//! `<extracted_data>{...}</extracted_data>` block. Only the block feeds the session; the
//! narration is surfaced to the user as-is.

mod parser;
mod upload;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::filing::domain::{
    DocumentId, ExtractionStatus, IncomeDocument, IncomeRecord, RecordSource,
};

pub use parser::{narrative_paragraphs, parse_extraction_response};
pub use upload::{UploadPolicy, UploadRejected, MAX_UPLOAD_BYTES};

/// Structured payload from the extraction block: the typed document plus per-field status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    #[serde(flatten)]
    pub document: IncomeDocument,
    #[serde(default)]
    pub extraction_status: BTreeMap<String, ExtractionStatus>,
}

impl ExtractedDocument {
    pub fn into_income_record(self, document_id: DocumentId) -> IncomeRecord {
        IncomeRecord {
            document_id,
            source: RecordSource::Extracted,
            document: self.document,
            extraction_status: self.extraction_status,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no extracted data found in response")]
    MissingBlock,
    #[error("failed to parse extracted data: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("extraction pattern unavailable: {0}")]
    Pattern(#[source] regex::Error),
}
