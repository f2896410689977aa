//! OCR engine abstraction.
//!
//! An engine turns an image or a PDF into raw, engine-specific JSON, one value
//! per page. Turning that JSON into [`TextLine`]s is left to
//! [`normalize_pages`], so engines stay thin transport adapters.
//!
//! [`TextLine`]: crate::TextLine
//! [`normalize_pages`]: crate::normalize_pages

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::{FileKind, PreparedImage, Result, ServiceHealth};

/// Shared, type-erased OCR provider.
pub type BoxedOcrProvider = Arc<dyn OcrProvider>;

/// A file submitted to an OCR engine.
#[derive(Clone)]
pub struct OcrInput {
    /// Kind of the file.
    pub kind: FileKind,
    /// File content: a prepared PNG for images, the original bytes for PDFs.
    pub bytes: Bytes,
}

impl OcrInput {
    /// Creates an input from a prepared image.
    pub fn image(image: &PreparedImage) -> Self {
        Self {
            kind: FileKind::Image,
            bytes: image.bytes.clone(),
        }
    }

    /// Creates an input from PDF bytes.
    pub fn pdf(bytes: Bytes) -> Self {
        Self {
            kind: FileKind::Pdf,
            bytes,
        }
    }
}

impl fmt::Debug for OcrInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrInput")
            .field("kind", &self.kind)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Core trait for OCR engines.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    /// Runs recognition and returns one raw payload per page.
    ///
    /// Images always produce a single page.
    async fn predict(&self, input: OcrInput) -> Result<Vec<Value>>;

    /// Performs a health check on the engine.
    async fn health_check(&self) -> Result<ServiceHealth>;
}

/// Creates ready-to-use OCR providers.
///
/// Implementations are expected to verify that the engine is reachable
/// before returning, so a successful `create` means the provider can serve
/// requests.
#[async_trait::async_trait]
pub trait OcrProviderFactory: Send + Sync {
    /// Builds and probes a new provider.
    async fn create(&self) -> Result<BoxedOcrProvider>;
}
