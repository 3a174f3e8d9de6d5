//! Response schema of the extraction endpoint.
//!
//! `confidence` and `is_missing` are passed through from the model as-is;
//! their range and consistency with `value` are conventions, not invariants.
use std::collections::BTreeMap;

use serde::Serialize;

/// One datum pulled from an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldExtraction {
    pub value: Option<String>,
    pub confidence: f64,
    pub is_missing: bool,
    pub source_file: String,
}

impl Default for FieldExtraction {
    /// The shape of a field the model did not report.
    fn default() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            is_missing: true,
            source_file: String::new(),
        }
    }
}

pub type FieldGroup = BTreeMap<String, FieldExtraction>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingMetadata {
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub total_files_processed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormExtractionResult {
    pub patient_info: FieldGroup,
    pub procedure_info: FieldGroup,
    pub diagnosis_info: FieldGroup,
    pub treatment_info: FieldGroup,
    pub medical_justification: FieldExtraction,
    pub insurance_info: FieldGroup,
    pub processing_metadata: ProcessingMetadata,
}
