#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Scanline Core
//!
//! Engine-agnostic pieces of the OCR pipeline. Nothing in this crate talks to
//! the network; concrete engines live in their own crates and plug in through
//! [`OcrProvider`] and [`OcrProviderFactory`].

/// Tracing target for OCR operations.
pub const TRACING_TARGET_OCR: &str = "scanline_core::ocr";

/// Tracing target for document detection and preparation.
pub const TRACING_TARGET_DOCUMENT: &str = "scanline_core::document";

mod error;
mod health;

pub mod document;
pub mod normalize;
pub mod ocr;
pub mod payload;
pub mod prepare;

pub use document::{Document, FileKind, UnsupportedFormat};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use normalize::{TextLine, normalize_pages};
pub use ocr::{BoxedOcrProvider, OcrInput, OcrProvider, OcrProviderFactory};
pub use payload::{DecodedPayload, decode_payload};
pub use prepare::{DEFAULT_MAX_SIDE, PreparedImage, prepare_image, warmup_image};
