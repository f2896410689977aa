//! OCR request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Document submitted for recognition.
#[must_use]
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecognizeDocument {
    /// Base64-encoded image or PDF, optionally as a `data:<mime>;base64,` URL.
    #[serde(default)]
    pub file: Option<String>,
}
