//! Application state and dependency injection.

mod coding;
mod config;
mod ocr_handle;
mod state;

pub use crate::service::coding::CodingHandle;
pub use crate::service::config::ServiceConfig;
pub use crate::service::ocr_handle::OcrHandle;
pub use crate::service::state::ServiceState;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Tracing target for service state management.
pub const TRACING_TARGET: &str = "scanline_server::service";
