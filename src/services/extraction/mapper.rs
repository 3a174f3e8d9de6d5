//! Model JSON → response schema.
//!
//! `ResponseMapper` is the last pipeline stage. With the vision processor it is
//! an identity transform because the processor already produces the target
//! shape; the field helpers below are shared with the processor.
use serde_json::{Map, Value};

use super::types::{FieldExtraction, FieldGroup, FormExtractionResult, ProcessingMetadata};

pub trait ResponseMapper: Send + Sync {
    fn map_to_response(&self, result: FormExtractionResult) -> FormExtractionResult;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughMapper;

impl ResponseMapper for PassthroughMapper {
    fn map_to_response(&self, result: FormExtractionResult) -> FormExtractionResult {
        result
    }
}

/// Builds the full result from the model's top-level JSON object.
///
/// Absent groups become empty, absent attributes take the "missing" defaults.
/// Structurally wrong JSON (a group or field that is not an object) is an error.
pub fn result_from_json(
    reply: &Value,
    metadata: ProcessingMetadata,
) -> Result<FormExtractionResult, String> {
    let root = reply
        .as_object()
        .ok_or_else(|| format!("expected a JSON object, got {}", kind(reply)))?;

    Ok(FormExtractionResult {
        patient_info: group_from_json(root, "patient_info")?,
        procedure_info: group_from_json(root, "procedure_info")?,
        diagnosis_info: group_from_json(root, "diagnosis_info")?,
        treatment_info: group_from_json(root, "treatment_info")?,
        medical_justification: match root.get("medical_justification") {
            None | Some(Value::Null) => FieldExtraction::default(),
            Some(v) => field_from_json("medical_justification", v)?,
        },
        insurance_info: group_from_json(root, "insurance_info")?,
        processing_metadata: metadata,
    })
}

pub fn group_from_json(root: &Map<String, Value>, group: &str) -> Result<FieldGroup, String> {
    match root.get(group) {
        None | Some(Value::Null) => Ok(FieldGroup::new()),
        Some(Value::Object(fields)) => fields
            .iter()
            .map(|(name, v)| Ok((name.clone(), field_from_json(name, v)?)))
            .collect(),
        Some(other) => Err(format!("`{group}` must be an object, got {}", kind(other))),
    }
}

pub fn field_from_json(name: &str, raw: &Value) -> Result<FieldExtraction, String> {
    let obj = raw
        .as_object()
        .ok_or_else(|| format!("field `{name}` must be an object, got {}", kind(raw)))?;

    let defaults = FieldExtraction::default();
    Ok(FieldExtraction {
        value: match obj.get("value") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        },
        confidence: obj
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(defaults.confidence),
        is_missing: obj
            .get("is_missing")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.is_missing),
        source_file: obj
            .get("source_file")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or(defaults.source_file),
    })
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omitted_attributes_default_to_missing() {
        let field = field_from_json("name", &json!({"value": "Jane Roe"})).unwrap();
        assert_eq!(field.value.as_deref(), Some("Jane Roe"));
        assert_eq!(field.confidence, 0.0);
        assert!(field.is_missing);
        assert_eq!(field.source_file, "");
    }

    #[test]
    fn values_pass_through_without_clamping() {
        let field = field_from_json(
            "code",
            &json!({"value": 72148, "confidence": 1.7, "is_missing": false, "source_file": "a.png"}),
        )
        .unwrap();
        assert_eq!(field.value.as_deref(), Some("72148"));
        assert_eq!(field.confidence, 1.7);
        assert!(!field.is_missing);
    }

    #[test]
    fn absent_groups_are_empty_and_justification_defaults() {
        let result = result_from_json(&json!({}), ProcessingMetadata::default()).unwrap();
        assert!(result.patient_info.is_empty());
        assert!(result.treatment_info.is_empty());
        assert_eq!(result.medical_justification, FieldExtraction::default());
    }

    #[test]
    fn non_object_reply_is_rejected() {
        let err = result_from_json(&json!(["patient"]), ProcessingMetadata::default()).unwrap_err();
        assert!(err.contains("an array"), "{err}");
    }

    #[test]
    fn non_object_field_is_rejected() {
        let err = result_from_json(
            &json!({"patient_info": {"name": "Jane Roe"}}),
            ProcessingMetadata::default(),
        )
        .unwrap_err();
        assert!(err.contains("`name`"), "{err}");
    }

    #[test]
    fn passthrough_returns_input_unchanged() {
        let result = result_from_json(
            &json!({"insurance_info": {"provider": {"value": "Acme Health", "confidence": 0.9, "is_missing": false}}}),
            ProcessingMetadata::default(),
        )
        .unwrap();
        assert_eq!(PassthroughMapper.map_to_response(result.clone()), result);
    }
}
