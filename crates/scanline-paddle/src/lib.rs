#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

use std::time::Duration;

/// Logging target for PaddleX client operations.
pub const PADDLEX_TARGET: &str = "scanline_paddle::client";

/// Logging target for provider creation and warmup.
pub const PROVIDER_TARGET: &str = "scanline_paddle::provider";

pub mod client;
mod provider;

pub use client::{PdClient, PdConfig};

/// Result type for all PaddleX operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error types for PaddleX operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP client errors (connection, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The pipeline answered with a non-zero error code
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// `errorMsg` from the response envelope
        message: String,
        /// `errorCode` from the response envelope
        code: Option<i64>,
    },

    /// Invalid or malformed API response
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of what's invalid
        message: String,
        /// Optional raw response body for debugging
        body: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {timeout:?}")]
    Timeout {
        /// Duration before timeout occurred
        timeout: Duration,
    },

    /// Rate limiting errors
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Details about the rate limit violation
        message: String,
        /// Time until rate limit resets (if known)
        retry_after: Option<Duration>,
    },

    /// Service unavailable
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Description of the unavailability
        message: String,
        /// Optional retry delay suggestion
        retry_after: Option<Duration>,
    },
}

impl Error {
    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>, code: Option<i64>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            code,
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>, body: Option<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            body,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    /// Check if this error indicates a temporary failure that might succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } | Error::RateLimit { .. } | Error::ServiceUnavailable { .. } => {
                true
            }
            Error::Http(err) => err.is_timeout() || err.is_connect(),
            Error::Api { status, .. } => matches!(*status, 429 | 502..=504),
            Error::Serialization(_) | Error::Config { .. } | Error::InvalidResponse { .. } => {
                false
            }
        }
    }

    /// Get the HTTP status code if this is an HTTP/API error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http(err) => err.status().map(|s| s.as_u16()),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the suggested retry delay, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimit { retry_after, .. } | Error::ServiceUnavailable { retry_after, .. } => {
                *retry_after
            }
            _ => None,
        }
    }
}

impl From<Error> for scanline_core::Error {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        let base = match &err {
            Error::Http(e) if e.is_timeout() => scanline_core::Error::timeout(),
            Error::Http(_) => scanline_core::Error::network_error(),
            Error::Timeout { .. } => scanline_core::Error::timeout(),
            Error::RateLimit { .. } | Error::ServiceUnavailable { .. } => {
                scanline_core::Error::service_unavailable()
            }
            Error::Api { .. } => scanline_core::Error::external_error(),
            Error::InvalidResponse { .. } | Error::Serialization(_) => {
                scanline_core::Error::serialization()
            }
            Error::Config { .. } => scanline_core::Error::configuration(),
        };

        base.with_message(message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use scanline_core::ErrorKind;

    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::timeout(Duration::from_secs(1)).is_retryable());
        assert!(Error::api(503, "busy", None).is_retryable());
        assert!(!Error::api(500, "model crashed", Some(500)).is_retryable());
        assert!(!Error::config("bad url").is_retryable());
    }

    #[test]
    fn test_core_error_mapping() {
        let core: scanline_core::Error =
            Error::service_unavailable("warming up", Some(Duration::from_secs(3))).into();
        assert_eq!(core.kind(), ErrorKind::ServiceUnavailable);
        assert!(core.to_string().contains("warming up"));

        let core: scanline_core::Error = Error::api(500, "inference failed", Some(1000)).into();
        assert_eq!(core.kind(), ErrorKind::ExternalError);
    }
}
