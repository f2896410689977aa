//! OCR response types.

use scanline_core::{FileKind, TextLine};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Recognized text of an uploaded document.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Recognition {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Detected document kind.
    pub file_type: FileKind,
    /// Recognized lines in reading order; PDF lines carry a 1-based `page`.
    pub results: Vec<TextLine>,
    /// Wall-clock processing time in seconds.
    pub processing_time: f64,
    /// Number of pages in the PDF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
}

impl Recognition {
    /// Creates a successful recognition result.
    pub fn new(file_type: FileKind, results: Vec<TextLine>, processing_time: f64) -> Self {
        Self {
            success: true,
            file_type,
            results,
            processing_time,
            page_count: None,
        }
    }

    /// Sets the page count.
    pub fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = Some(page_count);
        self
    }
}

/// Outcome of an OCR engine reinitialization.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Reinitialization {
    /// Whether a new engine connection is in place.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl Reinitialization {
    /// The engine was reconnected.
    pub fn succeeded() -> Self {
        Self {
            success: true,
            message: "OCR reinitialized successfully".to_owned(),
        }
    }

    /// The engine could not be reconnected.
    pub fn failed() -> Self {
        Self {
            success: false,
            message: "Failed to reinitialize OCR".to_owned(),
        }
    }
}
