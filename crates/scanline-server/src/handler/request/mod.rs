//! Request types for HTTP handlers.

mod analysis;
mod ocr;

pub use analysis::*;
pub use ocr::*;
