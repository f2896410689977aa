//! Middleware for `axum::Router` and HTTP request processing.
//!
//! This module provides the middleware stack applied around all handlers:
//! - Security (CORS, headers, body limits)
//! - Observability (request IDs, tracing)
//! - Recovery (panics, timeouts, service errors)
//! - OpenAPI documentation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::Router;
//! use scanline_server::middleware::{
//!     RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt,
//!     SecurityConfig,
//! };
//!
//! let app: Router = Router::new()
//!     .with_security(&SecurityConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```

mod observability;
mod recovery;
mod security;
mod specification;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{
    CorsConfig, FrameOptions, ReferrerPolicy, RouterSecurityExt, SecurityConfig,
    SecurityHeadersConfig,
};
pub use specification::{OpenApiConfig, RouterOpenApiExt};

/// Default request body limit: 64 MiB, enough for base64-encoded PDFs.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024 * 1024;
