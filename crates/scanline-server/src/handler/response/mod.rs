//! Response types for HTTP handlers.

mod analysis;
mod error_response;
mod monitors;
mod ocr;

pub use analysis::*;
pub use error_response::ErrorResponse;
pub use monitors::*;
pub use ocr::*;
