//! ICD-10 code extraction.

mod analysis;
mod prompt;
mod service;

pub use analysis::{CodeAnalysis, DiagnosisCode};
pub use prompt::{SYSTEM_PROMPT, user_prompt};
pub use service::{CodingService, enrich};
