//! Wire types of the PaddleX serving API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `fileType` value for PDF documents.
pub const FILE_TYPE_PDF: u8 = 0;

/// `fileType` value for images.
pub const FILE_TYPE_IMAGE: u8 = 1;

/// Request body of the OCR pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferRequest {
    /// Base64-encoded file content.
    pub file: String,
    /// [`FILE_TYPE_PDF`] or [`FILE_TYPE_IMAGE`].
    pub file_type: u8,
    /// Run document orientation classification.
    pub use_doc_orientation_classify: bool,
    /// Run document unwarping.
    pub use_doc_unwarping: bool,
    /// Run text line orientation classification.
    pub use_textline_orientation: bool,
    /// Skip visualization images in the response.
    pub visualize: bool,
}

/// Response envelope shared by all PaddleX pipelines.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferResponse {
    /// Request identifier assigned by the server.
    #[serde(default)]
    pub log_id: Option<String>,
    /// `0` on success. Required, so foreign JSON is not mistaken for a result.
    pub error_code: i64,
    /// Human-readable status.
    #[serde(default)]
    pub error_msg: Option<String>,
    /// Pipeline output, present on success.
    #[serde(default)]
    pub result: Option<InferResult>,
}

/// Output of the OCR pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferResult {
    /// One entry per image or PDF page.
    #[serde(default)]
    pub ocr_results: Vec<PageResult>,
}

/// Recognition result for a single page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Recognition output with the large intermediate arrays pruned.
    #[serde(default)]
    pub pruned_result: Value,
}
