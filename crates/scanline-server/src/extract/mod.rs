//! Request extractors with error handling that matches the API error body.
//!
//! - [`Json`]: JSON deserialization whose rejections render as
//!   [`ErrorResponse`] bodies and whose optional form treats malformed input
//!   as absent.
//!
//! [`ErrorResponse`]: crate::handler::response::ErrorResponse

pub mod reject;

pub use crate::extract::reject::Json;
