//! Request extractors with improved error handling.

pub mod enhanced_json;

pub use self::enhanced_json::Json;
