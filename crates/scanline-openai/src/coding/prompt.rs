//! Prompts for ICD-10 code extraction.

/// System prompt establishing the coding persona.
pub const SYSTEM_PROMPT: &str =
    "You are a medical coding expert specializing in ICD-10 code extraction.";

/// Builds the user prompt for the given OCR text.
pub fn user_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following medical text extracted via OCR and identify all relevant ICD-10 diagnosis codes.

For each code provide:
- code: the ICD-10 code
- description: the official description of the code
- explanation: why this code applies, citing the text
- confidence: "high", "medium" or "low"
- status: "active", "historical" or "need review"

The text may contain OCR errors; interpret them sensibly.

Respond ONLY with JSON in exactly this format:
{{
  "icd_codes": [
    {{
      "code": "E11.9",
      "description": "Type 2 diabetes mellitus without complications",
      "explanation": "...",
      "confidence": "high",
      "status": "active"
    }}
  ],
  "summary": "Brief summary of the patient's conditions",
  "total_codes": 1
}}

Medical text:
{text}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_and_format() {
        let prompt = user_prompt("Patient has hypertension.");
        assert!(prompt.ends_with("Patient has hypertension."));
        assert!(prompt.contains("\"icd_codes\""));
        assert!(prompt.contains("\"total_codes\""));
    }

    #[test]
    fn prompt_lists_status_vocabulary() {
        let prompt = user_prompt("");
        assert!(prompt.contains(r#""active", "historical" or "need review""#));
    }
}
