use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{ExtractedDocument, ExtractionError};

const OPEN_TAG: &str = "<extracted_data";

static DATA_BLOCK: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static TRAILING_COMMA: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn data_block() -> Result<&'static Regex, ExtractionError> {
    DATA_BLOCK
        .get_or_init(|| Regex::new(r"(?s)<extracted_data>\s*(.*?)\s*</extracted_data>"))
        .as_ref()
        .map_err(|err| ExtractionError::Pattern(err.clone()))
}

fn trailing_comma() -> Result<&'static Regex, ExtractionError> {
    TRAILING_COMMA
        .get_or_init(|| Regex::new(r",\s*([}\]])"))
        .as_ref()
        .map_err(|err| ExtractionError::Pattern(err.clone()))
}

/// Parse the `<extracted_data>` block of an extraction response.
///
/// A first parse failure is retried once after stripping trailing commas before a
/// closing brace or bracket; the error from the retry is the one reported.
pub fn parse_extraction_response(text: &str) -> Result<ExtractedDocument, ExtractionError> {
    let captures = data_block()?
        .captures(text)
        .ok_or(ExtractionError::MissingBlock)?;
    let raw = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

    match serde_json::from_str::<ExtractedDocument>(raw) {
        Ok(document) => Ok(document),
        Err(first) => {
            debug!(error = %first, "extracted data did not parse; retrying without trailing commas");
            let repaired = trailing_comma()?.replace_all(raw, "$1");
            serde_json::from_str::<ExtractedDocument>(&repaired)
                .map_err(ExtractionError::InvalidJson)
        }
    }
}

/// Narration paragraphs preceding the data block, blank paragraphs dropped.
pub fn narrative_paragraphs(text: &str) -> Vec<String> {
    let narration = match text.find(OPEN_TAG) {
        Some(index) => &text[..index],
        None => text,
    };
    narration
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::filing::domain::{DocumentType, ExtractionStatus, IncomeDocument};

    const W2_RESPONSE: &str = "Looks like a W-2 from Acme Corp.\n\n\
Wages are $80,000 with $9,000 withheld.\n\n\
<extracted_data>\n{\"doc_type\": \"W-2\", \"employer_name\": \"Acme Corp\", \"wages\": 80000, \
\"fed_income_tax_withheld\": 9000.00, \"box12_codes\": [{\"code\": \"D\", \"amount\": 6000}], \
\"extraction_status\": {\"wages\": \"extracted\", \"state\": \"not_found\"}}\n</extracted_data>";

    #[test]
    fn parses_tagged_block_into_typed_document() {
        let extracted = parse_extraction_response(W2_RESPONSE).expect("parse");
        assert_eq!(extracted.document.doc_type(), DocumentType::W2);
        match &extracted.document {
            IncomeDocument::W2(form) => {
                assert_eq!(form.wages, Some(80_000.0));
                assert_eq!(form.box12_total(&["D"]), 6_000.0);
            }
            other => panic!("expected W-2, got {other:?}"),
        }
        assert_eq!(
            extracted.extraction_status.get("state"),
            Some(&ExtractionStatus::NotFound)
        );
    }

    #[test]
    fn repairs_trailing_commas() {
        let text = "<extracted_data>{\"doc_type\": \"1099-INT\", \"interest_income\": 412.5, \
\"extraction_status\": {\"interest_income\": \"extracted\",},}</extracted_data>";
        let extracted = parse_extraction_response(text).expect("repaired parse");
        assert_eq!(extracted.document.primary_amount(), 412.5);
    }

    #[test]
    fn missing_block_and_bad_json_are_distinct() {
        assert!(matches!(
            parse_extraction_response("no data here"),
            Err(ExtractionError::MissingBlock)
        ));
        assert!(matches!(
            parse_extraction_response("<extracted_data>{not json</extracted_data>"),
            Err(ExtractionError::InvalidJson(_))
        ));
    }

    #[test]
    fn unrecognized_doc_type_maps_to_unknown() {
        let text = "<extracted_data>{\"doc_type\": \"1099-R\", \"gross_distribution\": 100}</extracted_data>";
        let extracted = parse_extraction_response(text).expect("parse");
        assert_eq!(extracted.document.doc_type(), DocumentType::Unknown);
    }

    #[test]
    fn narration_splits_on_blank_lines_before_block() {
        let paragraphs = narrative_paragraphs(W2_RESPONSE);
        assert_eq!(
            paragraphs,
            vec![
                "Looks like a W-2 from Acme Corp.".to_string(),
                "Wages are $80,000 with $9,000 withheld.".to_string(),
            ]
        );
    }
}
