use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::computation::FilingComputation;

/// Identifier wrapper for interview sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Identity of an uploaded or declared document; re-uploads replace by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub String);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedFilingJointly,
    MarriedFilingSeparately,
    HeadOfHousehold,
    QualifyingSurvivingSpouse,
}

impl FilingStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Single,
            Self::MarriedFilingJointly,
            Self::MarriedFilingSeparately,
            Self::HeadOfHousehold,
            Self::QualifyingSurvivingSpouse,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::MarriedFilingJointly => "Married Filing Jointly",
            Self::MarriedFilingSeparately => "Married Filing Separately",
            Self::HeadOfHousehold => "Head of Household",
            Self::QualifyingSurvivingSpouse => "Qualifying Surviving Spouse",
        }
    }

    /// Statuses that read the joint column of single/joint tables.
    pub const fn is_joint(self) -> bool {
        matches!(
            self,
            Self::MarriedFilingJointly | Self::QualifyingSurvivingSpouse
        )
    }
}

/// States with modeled income tax tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateCode {
    #[serde(rename = "CA")]
    California,
    #[serde(rename = "NY")]
    NewYork,
}

impl StateCode {
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::California => "CA",
            Self::NewYork => "NY",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::California => "California",
            Self::NewYork => "New York",
        }
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for StateCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CA" | "CALIFORNIA" => Ok(Self::California),
            "NY" | "NEW YORK" => Ok(Self::NewYork),
            other => Err(format!("unsupported state '{other}' (expected CA or NY)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "W-2")]
    W2,
    #[serde(rename = "1099-NEC")]
    Form1099Nec,
    #[serde(rename = "1099-INT")]
    Form1099Int,
    #[serde(rename = "1099-DIV")]
    Form1099Div,
    #[serde(rename = "1099-B")]
    Form1099B,
    #[serde(rename = "1098")]
    Form1098,
    #[serde(rename = "1098-T")]
    Form1098T,
    #[serde(rename = "1098-E")]
    Form1098E,
    #[serde(rename = "unknown")]
    Unknown,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::W2 => "W-2",
            Self::Form1099Nec => "1099-NEC",
            Self::Form1099Int => "1099-INT",
            Self::Form1099Div => "1099-DIV",
            Self::Form1099B => "1099-B",
            Self::Form1098 => "1098",
            Self::Form1098T => "1098-T",
            Self::Form1098E => "1098-E",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase().replace(' ', "-");
        let document_type = match normalized.as_str() {
            "W-2" | "W2" => Self::W2,
            "1099-NEC" | "1099NEC" => Self::Form1099Nec,
            "1099-INT" | "1099INT" => Self::Form1099Int,
            "1099-DIV" | "1099DIV" => Self::Form1099Div,
            "1099-B" | "1099B" => Self::Form1099B,
            "1098" => Self::Form1098,
            "1098-T" | "1098T" => Self::Form1098T,
            "1098-E" | "1098E" => Self::Form1098E,
            "UNKNOWN" => Self::Unknown,
            _ => return Err(format!("unrecognized document type '{value}'")),
        };
        Ok(document_type)
    }
}

/// Whether the extraction collaborator could read a given field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Extracted,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Extracted,
    Manual,
}

/// One W-2 box 12 entry (e.g. code D for 401(k) elective deferrals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodedAmount {
    pub code: String,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct W2 {
    pub employer_name: Option<String>,
    pub employer_ein: Option<String>,
    pub employee_name: Option<String>,
    pub employee_ssn_last4: Option<String>,
    pub wages: Option<f64>,
    pub fed_income_tax_withheld: Option<f64>,
    pub social_security_wages: Option<f64>,
    pub social_security_tax_withheld: Option<f64>,
    pub medicare_wages: Option<f64>,
    pub medicare_tax_withheld: Option<f64>,
    pub state: Option<String>,
    pub state_wages: Option<f64>,
    pub state_income_tax_withheld: Option<f64>,
    #[serde(deserialize_with = "null_as_empty")]
    pub box12_codes: Vec<CodedAmount>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl W2 {
    /// Sum of box 12 amounts carrying any of the given codes.
    pub fn box12_total(&self, codes: &[&str]) -> f64 {
        total(
            self.box12_codes
                .iter()
                .filter(|entry| {
                    codes
                        .iter()
                        .any(|code| entry.code.trim().eq_ignore_ascii_case(code))
                })
                .map(|entry| amount(entry.amount)),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Nec {
    pub payer_name: Option<String>,
    pub payer_tin: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_ssn_last4: Option<String>,
    pub nonemployee_compensation: Option<f64>,
    pub fed_income_tax_withheld: Option<f64>,
    pub state: Option<String>,
    pub state_income: Option<f64>,
    pub state_tax_withheld: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Int {
    pub payer_name: Option<String>,
    pub interest_income: Option<f64>,
    pub fed_income_tax_withheld: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099Div {
    pub payer_name: Option<String>,
    pub ordinary_dividends: Option<f64>,
    pub qualified_dividends: Option<f64>,
    pub fed_income_tax_withheld: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1099B {
    pub payer_name: Option<String>,
    pub proceeds: Option<f64>,
    pub cost_basis: Option<f64>,
    pub gain_loss: Option<f64>,
    pub short_term_gain: Option<f64>,
    pub long_term_gain: Option<f64>,
    pub fed_income_tax_withheld: Option<f64>,
}

impl Form1099B {
    /// Reported gain, or proceeds less basis when the gain box was not read.
    pub fn net_gain(&self) -> f64 {
        match self.gain_loss {
            Some(gain) => gain,
            None => amount(self.proceeds) - amount(self.cost_basis),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1098 {
    pub lender_name: Option<String>,
    pub mortgage_interest: Option<f64>,
    pub mortgage_insurance_premiums: Option<f64>,
    pub points_paid: Option<f64>,
    pub property_taxes: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1098T {
    pub institution_name: Option<String>,
    pub amounts_billed: Option<f64>,
    pub scholarships_grants: Option<f64>,
}

impl Form1098T {
    pub fn net_qualified_expenses(&self) -> f64 {
        (amount(self.amounts_billed) - amount(self.scholarships_grants)).max(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form1098E {
    pub lender_name: Option<String>,
    pub student_loan_interest: Option<f64>,
}

/// Typed document payload; field names follow the extraction JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "doc_type")]
pub enum IncomeDocument {
    #[serde(rename = "W-2")]
    W2(W2),
    #[serde(rename = "1099-NEC")]
    Form1099Nec(Form1099Nec),
    #[serde(rename = "1099-INT")]
    Form1099Int(Form1099Int),
    #[serde(rename = "1099-DIV")]
    Form1099Div(Form1099Div),
    #[serde(rename = "1099-B")]
    Form1099B(Form1099B),
    #[serde(rename = "1098")]
    Form1098(Form1098),
    #[serde(rename = "1098-T")]
    Form1098T(Form1098T),
    #[serde(rename = "1098-E")]
    Form1098E(Form1098E),
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl IncomeDocument {
    pub const fn doc_type(&self) -> DocumentType {
        match self {
            Self::W2(_) => DocumentType::W2,
            Self::Form1099Nec(_) => DocumentType::Form1099Nec,
            Self::Form1099Int(_) => DocumentType::Form1099Int,
            Self::Form1099Div(_) => DocumentType::Form1099Div,
            Self::Form1099B(_) => DocumentType::Form1099B,
            Self::Form1098(_) => DocumentType::Form1098,
            Self::Form1098T(_) => DocumentType::Form1098T,
            Self::Form1098E(_) => DocumentType::Form1098E,
            Self::Unknown => DocumentType::Unknown,
        }
    }

    /// Employer, payer, lender, or institution named on the form.
    pub fn issuer(&self) -> Option<&str> {
        let name = match self {
            Self::W2(form) => &form.employer_name,
            Self::Form1099Nec(form) => &form.payer_name,
            Self::Form1099Int(form) => &form.payer_name,
            Self::Form1099Div(form) => &form.payer_name,
            Self::Form1099B(form) => &form.payer_name,
            Self::Form1098(form) => &form.lender_name,
            Self::Form1098T(form) => &form.institution_name,
            Self::Form1098E(form) => &form.lender_name,
            Self::Unknown => return None,
        };
        name.as_deref()
    }

    /// The headline amount of the form, used for duplicate detection and imports.
    pub fn primary_amount(&self) -> f64 {
        match self {
            Self::W2(form) => amount(form.wages),
            Self::Form1099Nec(form) => amount(form.nonemployee_compensation),
            Self::Form1099Int(form) => amount(form.interest_income),
            Self::Form1099Div(form) => amount(form.ordinary_dividends),
            Self::Form1099B(form) => form.net_gain(),
            Self::Form1098(form) => amount(form.mortgage_interest),
            Self::Form1098T(form) => amount(form.amounts_billed),
            Self::Form1098E(form) => amount(form.student_loan_interest),
            Self::Unknown => 0.0,
        }
    }

    pub fn federal_withholding(&self) -> f64 {
        match self {
            Self::W2(form) => amount(form.fed_income_tax_withheld),
            Self::Form1099Nec(form) => amount(form.fed_income_tax_withheld),
            Self::Form1099Int(form) => amount(form.fed_income_tax_withheld),
            Self::Form1099Div(form) => amount(form.fed_income_tax_withheld),
            Self::Form1099B(form) => amount(form.fed_income_tax_withheld),
            Self::Form1098(_) | Self::Form1098T(_) | Self::Form1098E(_) | Self::Unknown => 0.0,
        }
    }

    pub fn state_withholding(&self) -> f64 {
        match self {
            Self::W2(form) => amount(form.state_income_tax_withheld),
            Self::Form1099Nec(form) => amount(form.state_tax_withheld),
            _ => 0.0,
        }
    }
}

/// One income (or deduction-bearing) document attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub document_id: DocumentId,
    pub source: RecordSource,
    pub document: IncomeDocument,
    #[serde(default)]
    pub extraction_status: BTreeMap<String, ExtractionStatus>,
}

impl IncomeRecord {
    pub fn doc_type(&self) -> DocumentType {
        self.document.doc_type()
    }

    /// True when every named field was read by extraction; manual records count as confirmed.
    pub fn fields_extracted(&self, fields: &[&str]) -> bool {
        if self.source == RecordSource::Manual {
            return true;
        }
        fields.iter().all(|field| {
            self.extraction_status.get(*field) == Some(&ExtractionStatus::Extracted)
        })
    }

    pub fn missing_fields(&self) -> Vec<&str> {
        self.extraction_status
            .iter()
            .filter(|(_, status)| **status == ExtractionStatus::NotFound)
            .map(|(field, _)| field.as_str())
            .collect()
    }
}

/// Upload metadata kept alongside the income records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub document_id: DocumentId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dependents {
    pub children_under_17: u8,
    pub other_dependents: u8,
    /// Dependents under 13 for the child and dependent care credit.
    pub childcare_dependents: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionChoice {
    #[default]
    Standard,
    Itemized,
}

/// Interview-entered amounts and flags; every field defaults to zero/false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualEntries {
    pub capital_gains: f64,
    pub other_income: f64,
    pub retirement_contributions: f64,
    pub hsa_contributions: f64,
    pub hsa_family_coverage: bool,
    pub student_loan_interest: f64,
    pub se_health_insurance: f64,
    pub is_educator: bool,
    pub educator_expenses: f64,
    pub mortgage_interest: f64,
    pub state_local_taxes_paid: f64,
    pub charitable_contributions: f64,
    pub medical_expenses: f64,
    pub home_office_sqft: f64,
    pub business_miles: f64,
    pub ev_purchase: bool,
    pub childcare_expenses: f64,
    pub education_expenses: f64,
    pub is_renter: bool,
    pub estimated_payments: f64,
    pub state_estimated_payments: f64,
}

/// Follow-up answer recorded against a gap question identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GapAnswer {
    Flag(bool),
    Amount(f64),
    Text(String),
}

impl GapAnswer {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            Self::Amount(value) => Some(*value > 0.0),
            Self::Text(_) => None,
        }
    }
}

/// The explicit state object threaded through computation, rules and gap selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSession {
    pub tax_year: u16,
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub state: Option<StateCode>,
    #[serde(default)]
    pub dependents: Dependents,
    #[serde(default)]
    pub documents: Vec<DocumentDescriptor>,
    #[serde(default)]
    pub incomes: Vec<IncomeRecord>,
    #[serde(default)]
    pub manual: ManualEntries,
    #[serde(default)]
    pub deduction_choice: DeductionChoice,
    #[serde(default)]
    pub gap_answers: BTreeMap<String, GapAnswer>,
    #[serde(default)]
    pub filing: Option<FilingComputation>,
}

impl TaxSession {
    pub fn new(tax_year: u16, filing_status: FilingStatus) -> Self {
        Self {
            tax_year,
            filing_status,
            state: None,
            dependents: Dependents::default(),
            documents: Vec::new(),
            incomes: Vec::new(),
            manual: ManualEntries::default(),
            deduction_choice: DeductionChoice::Standard,
            gap_answers: BTreeMap::new(),
            filing: None,
        }
    }

    /// Insert a record, replacing any record with the same document identity.
    /// Returns true when an existing record was replaced.
    pub fn upsert_income(&mut self, record: IncomeRecord) -> bool {
        self.filing = None;
        match self
            .incomes
            .iter_mut()
            .find(|existing| existing.document_id == record.document_id)
        {
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.incomes.push(record);
                false
            }
        }
    }

    pub fn upsert_document(&mut self, descriptor: DocumentDescriptor) {
        match self
            .documents
            .iter_mut()
            .find(|existing| existing.document_id == descriptor.document_id)
        {
            Some(existing) => *existing = descriptor,
            None => self.documents.push(descriptor),
        }
    }

    pub fn record_gap_answer(&mut self, question_id: impl Into<String>, answer: GapAnswer) {
        self.filing = None;
        self.gap_answers.insert(question_id.into(), answer);
    }

    pub fn has_document(&self, doc_type: DocumentType) -> bool {
        self.incomes
            .iter()
            .any(|record| record.doc_type() == doc_type)
    }

    pub fn answered(&self, question_id: &str) -> bool {
        self.gap_answers.contains_key(question_id)
    }

    pub fn answer_flag(&self, question_id: &str) -> Option<bool> {
        self.gap_answers.get(question_id).and_then(GapAnswer::as_flag)
    }

    pub fn w2s(&self) -> impl Iterator<Item = (&IncomeRecord, &W2)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::W2(form) => Some((record, form)),
            _ => None,
        })
    }

    pub fn necs(&self) -> impl Iterator<Item = (&IncomeRecord, &Form1099Nec)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::Form1099Nec(form) => Some((record, form)),
            _ => None,
        })
    }

    pub fn interest_forms(&self) -> impl Iterator<Item = (&IncomeRecord, &Form1099Int)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::Form1099Int(form) => Some((record, form)),
            _ => None,
        })
    }

    pub fn dividend_forms(&self) -> impl Iterator<Item = (&IncomeRecord, &Form1099Div)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::Form1099Div(form) => Some((record, form)),
            _ => None,
        })
    }

    pub fn brokerage_forms(&self) -> impl Iterator<Item = (&IncomeRecord, &Form1099B)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::Form1099B(form) => Some((record, form)),
            _ => None,
        })
    }

    pub fn mortgage_forms(&self) -> impl Iterator<Item = (&IncomeRecord, &Form1098)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::Form1098(form) => Some((record, form)),
            _ => None,
        })
    }

    pub fn tuition_forms(&self) -> impl Iterator<Item = (&IncomeRecord, &Form1098T)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::Form1098T(form) => Some((record, form)),
            _ => None,
        })
    }

    pub fn student_loan_forms(&self) -> impl Iterator<Item = (&IncomeRecord, &Form1098E)> {
        self.incomes.iter().filter_map(|record| match &record.document {
            IncomeDocument::Form1098E(form) => Some((record, form)),
            _ => None,
        })
    }
}

/// Absent numeric fields count as zero.
pub fn amount(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Sum starting from positive zero; `Iterator::sum` yields `-0.0` for an empty `f64` iterator.
pub fn total(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, |sum, value| sum + value)
}
