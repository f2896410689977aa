//! ICD-10 analysis request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Clinical text submitted for code extraction.
#[must_use]
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeText {
    /// Free text, typically the output of `/ocr`.
    #[serde(default)]
    pub text: Option<String>,
}
