//! File type detection for uploaded documents.
//!
//! Uploads carry no reliable type information, so detection tries the image
//! decoders first and falls back to the PDF parser. When both refuse the
//! input, both reasons are reported together.

use bytes::Bytes;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{Error, TRACING_TARGET_DOCUMENT};

/// Kind of document accepted by the OCR pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FileKind {
    /// Raster image in any format the image decoders understand.
    Image,
    /// Portable Document Format.
    Pdf,
}

/// A decoded upload, ready for preparation or direct submission.
#[derive(Debug, Clone)]
pub enum Document {
    /// Decoded raster image.
    Image(DynamicImage),
    /// Parsed PDF with its original bytes.
    Pdf {
        /// Original file content.
        bytes: Bytes,
        /// Number of pages in the page tree.
        page_count: usize,
    },
}

impl Document {
    /// Detects whether `bytes` hold an image or a PDF.
    pub fn sniff(bytes: &[u8]) -> Result<Self, UnsupportedFormat> {
        let image_error = match image::load_from_memory(bytes) {
            Ok(image) => {
                tracing::debug!(
                    target: TRACING_TARGET_DOCUMENT,
                    width = image.width(),
                    height = image.height(),
                    "Detected image input"
                );
                return Ok(Self::Image(image));
            }
            Err(err) => err.to_string(),
        };

        let pdf_error = match lopdf::Document::load_mem(bytes) {
            Ok(pdf) => {
                let page_count = pdf.get_pages().len();
                if page_count > 0 {
                    tracing::debug!(
                        target: TRACING_TARGET_DOCUMENT,
                        page_count,
                        "Detected PDF input"
                    );
                    return Ok(Self::Pdf {
                        bytes: Bytes::copy_from_slice(bytes),
                        page_count,
                    });
                }
                "PDF contains no pages".to_owned()
            }
            Err(err) => err.to_string(),
        };

        tracing::debug!(
            target: TRACING_TARGET_DOCUMENT,
            image_error = %image_error,
            pdf_error = %pdf_error,
            "Input is neither an image nor a PDF"
        );

        Err(UnsupportedFormat {
            image_error,
            pdf_error,
        })
    }

    /// Returns the detected file kind.
    pub fn kind(&self) -> FileKind {
        match self {
            Self::Image(_) => FileKind::Image,
            Self::Pdf { .. } => FileKind::Pdf,
        }
    }
}

/// Input rejected by both the image decoders and the PDF parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Unsupported file format. Must be an image (PNG, JPG, etc.) or PDF. \
     Image error: {image_error}, PDF error: {pdf_error}"
)]
pub struct UnsupportedFormat {
    /// Reason the image decoders gave.
    pub image_error: String,
    /// Reason the PDF parser gave.
    pub pdf_error: String,
}

impl From<UnsupportedFormat> for Error {
    fn from(value: UnsupportedFormat) -> Self {
        Error::unsupported_format()
            .with_message(value.to_string())
            .with_source(value)
    }
}
