//! Mock implementations of the OCR engine and the LLM coding services.
//!
//! The mocks answer deterministically and count their calls, which lets
//! handler tests assert how often the engine was reached.

mod coding;
mod optical;

use std::sync::Arc;

pub use coding::{MockCodeLookup, MockCompletionProvider};
pub use optical::{MockOcrConfig, MockOcrFactory, MockOcrProvider};
use scanline_openai::CodingService;

/// Creates a [`CodingService`] backed by the given canned reply and an
/// empty description table.
pub fn create_mock_coding_service(reply: impl Into<String>) -> CodingService {
    CodingService::new(
        Arc::new(MockCompletionProvider::new(reply)),
        Arc::new(MockCodeLookup::default()),
    )
}
