//! Parsed ICD-10 analysis results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys that may carry a code description, in order of preference.
const DESCRIPTION_KEYS: [&str; 4] = ["description", "desc", "title", "name"];

/// A diagnosis code suggested by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct DiagnosisCode {
    /// ICD-10 code, e.g. `E11.9`.
    #[serde(default)]
    pub code: String,
    /// Official description, filled by lookup when the model omitted it.
    #[serde(default)]
    pub description: String,
    /// Why the code applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// `high`, `medium` or `low`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    /// `active`, `historical` or `need review`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Any other fields the model returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DiagnosisCode {
    /// Reads a code entry leniently; non-object entries are rejected.
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let mut extra = map.clone();

        let mut take = |key: &str| extra.remove(key).as_ref().and_then(string_of);

        let code = take("code").unwrap_or_default().trim().to_owned();
        let explanation = take("explanation");
        let confidence = take("confidence");
        let status = take("status");
        let description = take("description").unwrap_or_default();

        Some(Self {
            code,
            description,
            explanation,
            confidence,
            status,
            extra,
        })
    }

    /// Returns the first non-empty description among the known aliases.
    pub fn resolved_description(&self) -> Option<&str> {
        let description = self.description.trim();
        if !description.is_empty() {
            return Some(description);
        }

        DESCRIPTION_KEYS[1..]
            .iter()
            .filter_map(|key| self.extra.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

/// Structured result of an ICD-10 analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct CodeAnalysis {
    /// Extracted codes.
    #[serde(default)]
    pub icd_codes: Vec<DiagnosisCode>,
    /// Short summary of the patient's conditions.
    #[serde(default)]
    pub summary: String,
    /// Number of codes as reported by the model.
    #[serde(default)]
    pub total_codes: u64,
    /// Model reply, kept only when it could not be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// Any other fields the model returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CodeAnalysis {
    /// Parses a model reply.
    ///
    /// A Markdown code fence around the JSON is tolerated. Replies that are not
    /// a JSON object are preserved verbatim in `summary` and `raw_response`.
    pub fn from_reply(reply: &str) -> Self {
        match serde_json::from_str::<Value>(strip_code_fence(reply)) {
            Ok(Value::Object(map)) => Self::from_object(map),
            _ => Self::unparsed(reply),
        }
    }

    /// Wraps a reply that could not be parsed.
    pub fn unparsed(reply: &str) -> Self {
        Self {
            summary: reply.to_owned(),
            raw_response: Some(reply.to_owned()),
            ..Self::default()
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Self {
        let icd_codes: Vec<DiagnosisCode> = map
            .remove("icd_codes")
            .as_ref()
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(DiagnosisCode::from_value).collect())
            .unwrap_or_default();

        let summary = map
            .remove("summary")
            .as_ref()
            .and_then(string_of)
            .unwrap_or_default();

        let total_codes = map
            .remove("total_codes")
            .as_ref()
            .and_then(|value| match value {
                Value::Number(number) => number.as_u64(),
                Value::String(text) => text.trim().parse().ok(),
                _ => None,
            })
            .unwrap_or(icd_codes.len() as u64);

        let raw_response = map.remove("raw_response").as_ref().and_then(string_of);

        Self {
            icd_codes,
            summary,
            total_codes,
            raw_response,
            extra: map,
        }
    }
}

fn string_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
