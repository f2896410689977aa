//! Error types for chat completions and code lookups.

use std::time::Duration;

use thiserror::Error;

use crate::client::LlmConfigBuilderError;

/// Result type for scanline-openai operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while talking to the completions API.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: String,
    },

    /// The API key was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The API is throttling requests.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Error message extracted from the body.
        message: String,
        /// Delay suggested by the `retry-after` header.
        retry_after: Option<Duration>,
    },

    /// The API answered with an unexpected body.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Returns true if the request may succeed when retried later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::RateLimit { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns the suggested retry delay, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<LlmConfigBuilderError> for Error {
    fn from(err: LlmConfigBuilderError) -> Self {
        Self::Config(err.to_string())
    }
}
