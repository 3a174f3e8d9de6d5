/// Fixed instruction block sent ahead of the caller's notes and the images.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"You are an expert medical form analyzer specializing in prior authorization requests.
Extract the requested information from the attached medical documents, including handwritten notes.

Formatting rules:
1. Reply with ONLY a JSON object that matches the structure below. No prose, no code fences.
2. Every field is an object with:
   - "value": the extracted text, or null when it cannot be found
   - "confidence": a number from 0.0 to 1.0 describing how sure you are
   - "is_missing": true when the field was not found, otherwise false
   - "source_file": the file name the value was read from
3. Use the keys exactly as written below.
4. Transcribe handwriting exactly as written.

Structure:
{
  "patient_info": {
    "name": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"},
    "id": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"}
  },
  "procedure_info": {
    "code": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"},
    "description": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"}
  },
  "diagnosis_info": {
    "primary_diagnosis": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"},
    "symptoms": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"},
    "affected_area": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"}
  },
  "treatment_info": {
    "prescribed_treatment": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"},
    "treatment_type": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"}
  },
  "insurance_info": {
    "provider": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"},
    "policy_number": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"}
  },
  "medical_justification": {"value": "string or null", "confidence": 0.95, "is_missing": false, "source_file": "string"}
}"#;

/// Instruction block followed by the caller's free-text context, if any.
pub fn build_prompt(additional_context: Option<&str>) -> String {
    let context = additional_context.map(str::trim).unwrap_or("");
    format!("{EXTRACTION_INSTRUCTIONS}\n\n{context}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_appended_after_instructions() {
        let prompt = build_prompt(Some("  Patient prefers morning appointments "));
        assert!(prompt.starts_with(EXTRACTION_INSTRUCTIONS));
        assert!(prompt.ends_with("\n\nPatient prefers morning appointments"));
    }

    #[test]
    fn no_context_leaves_instructions_intact() {
        assert_eq!(build_prompt(None), format!("{EXTRACTION_INSTRUCTIONS}\n\n"));
    }
}
