//! ICD-10 analysis response types.

use scanline_openai::CodeAnalysis;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Codes extracted from the submitted text.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CodeExtraction {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Parsed and enriched model output.
    pub analysis: CodeAnalysis,
    /// Length of the analyzed text in characters.
    pub text_length: usize,
}
