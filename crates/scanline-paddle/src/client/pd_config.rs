//! Configuration for the PaddleX HTTP client.

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Address of a locally started PaddleX serving instance.
    pub const BASE_URL: &str = "http://127.0.0.1:8080";

    /// Path of the OCR pipeline endpoint.
    pub const PIPELINE_PATH: &str = "/ocr";

    /// Request timeout in seconds.
    pub const TIMEOUT_SECS: u64 = 120;

    /// Maximum number of retries for retryable errors.
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay between retries in milliseconds.
    pub const RETRY_BACKOFF_MS: u64 = 500;
}

/// Configuration for the PaddleX HTTP client.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use scanline_paddle::PdConfig;
///
/// let config = PdConfig::new("http://paddlex:8080")
///     .unwrap()
///     .with_timeout(Duration::from_secs(60))
///     .with_textline_orientation(true);
///
/// assert_eq!(config.endpoint().unwrap().as_str(), "http://paddlex:8080/ocr");
/// ```
#[derive(Debug, Clone)]
pub struct PdConfig {
    /// Base URL of the PaddleX service
    base_url: Url,

    /// Path of the OCR pipeline relative to the base URL
    pipeline_path: String,

    /// API key for authentication (if required)
    api_key: Option<String>,

    /// Request timeout duration
    timeout: Duration,

    /// Maximum number of retry attempts for retryable errors
    max_retries: u32,

    /// Base delay for linear backoff
    retry_backoff: Duration,

    /// User agent string for HTTP requests
    user_agent: String,

    /// Whether to verify SSL certificates
    verify_ssl: bool,

    /// Custom HTTP headers to include in all requests
    custom_headers: Vec<(String, String)>,

    /// Run document orientation classification
    use_doc_orientation_classify: bool,

    /// Run document unwarping
    use_doc_unwarping: bool,

    /// Run text line orientation classification
    use_textline_orientation: bool,

    /// Send a blank image after creating a provider
    warmup: bool,
}

impl PdConfig {
    /// Create a new configuration with the given base URL and default settings.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            Error::config(format!("Invalid base URL '{}': {}", base_url.as_ref(), e))
        })?;

        Ok(Self {
            base_url,
            pipeline_path: defaults::PIPELINE_PATH.to_owned(),
            api_key: None,
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            max_retries: defaults::MAX_RETRIES,
            retry_backoff: Duration::from_millis(defaults::RETRY_BACKOFF_MS),
            user_agent: format!("scanline-paddle/{}", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            custom_headers: Vec::new(),
            use_doc_orientation_classify: false,
            use_doc_unwarping: false,
            use_textline_orientation: false,
            warmup: true,
        })
    }

    /// Get the base URL of the PaddleX service.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve the OCR pipeline endpoint.
    pub fn endpoint(&self) -> Result<Url> {
        self.base_url
            .join(&self.pipeline_path)
            .map_err(|e| Error::config(format!("Failed to construct pipeline URL: {}", e)))
    }

    /// Resolve the health check endpoint.
    pub fn health_endpoint(&self) -> Result<Url> {
        self.base_url
            .join("/health")
            .map_err(|e| Error::config(format!("Failed to construct health check URL: {}", e)))
    }

    /// Get the API key (if configured).
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the maximum number of retry attempts.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the retry backoff duration.
    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    /// Get the user agent string.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get whether SSL verification is enabled.
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Get custom headers.
    pub fn custom_headers(&self) -> &[(String, String)] {
        &self.custom_headers
    }

    /// Get whether document orientation classification is requested.
    pub fn use_doc_orientation_classify(&self) -> bool {
        self.use_doc_orientation_classify
    }

    /// Get whether document unwarping is requested.
    pub fn use_doc_unwarping(&self) -> bool {
        self.use_doc_unwarping
    }

    /// Get whether text line orientation classification is requested.
    pub fn use_textline_orientation(&self) -> bool {
        self.use_textline_orientation
    }

    /// Get whether any optional pipeline stage is enabled.
    pub fn has_pipeline_options(&self) -> bool {
        self.use_doc_orientation_classify || self.use_doc_unwarping || self.use_textline_orientation
    }

    /// Disable every optional pipeline stage.
    pub fn without_pipeline_options(self) -> Self {
        self.with_doc_orientation_classify(false)
            .with_doc_unwarping(false)
            .with_textline_orientation(false)
    }

    /// Get whether new providers are warmed up.
    pub fn warmup(&self) -> bool {
        self.warmup
    }

    /// Set the OCR pipeline path.
    pub fn with_pipeline_path(mut self, path: impl Into<String>) -> Self {
        self.pipeline_path = path.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the retry backoff duration.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set whether to verify SSL certificates.
    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Add a custom header to all requests.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((key.into(), value.into()));
        self
    }

    /// Enable or disable document orientation classification.
    pub fn with_doc_orientation_classify(mut self, enabled: bool) -> Self {
        self.use_doc_orientation_classify = enabled;
        self
    }

    /// Enable or disable document unwarping.
    pub fn with_doc_unwarping(mut self, enabled: bool) -> Self {
        self.use_doc_unwarping = enabled;
        self
    }

    /// Enable or disable text line orientation classification.
    pub fn with_textline_orientation(mut self, enabled: bool) -> Self {
        self.use_textline_orientation = enabled;
        self
    }

    /// Enable or disable warmup after provider creation.
    pub fn with_warmup(mut self, enabled: bool) -> Self {
        self.warmup = enabled;
        self
    }
}

impl Default for PdConfig {
    fn default() -> Self {
        Self::new(defaults::BASE_URL).expect("Default URL should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PdConfig::default();
        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.max_retries(), 3);
        assert!(config.verify_ssl());
        assert!(config.warmup());
        assert!(!config.use_doc_orientation_classify());
        assert!(!config.use_doc_unwarping());
        assert!(!config.use_textline_orientation());
    }

    #[test]
    fn test_invalid_url() {
        assert!(PdConfig::new("not a url").is_err());
    }

    #[test]
    fn test_endpoints() {
        let config = PdConfig::new("http://ocr.internal:9000/base/").unwrap();
        assert_eq!(config.endpoint().unwrap().as_str(), "http://ocr.internal:9000/ocr");
        assert_eq!(
            config.health_endpoint().unwrap().as_str(),
            "http://ocr.internal:9000/health"
        );

        let config = config.with_pipeline_path("v2/ocr");
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "http://ocr.internal:9000/base/v2/ocr"
        );
    }

    #[test]
    fn test_fluent_setters() {
        let config = PdConfig::default()
            .with_api_key("secret")
            .with_max_retries(0)
            .with_retry_backoff(Duration::from_millis(10))
            .with_header("X-Tenant", "clinic")
            .with_doc_unwarping(true)
            .with_warmup(false);

        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.max_retries(), 0);
        assert_eq!(config.retry_backoff(), Duration::from_millis(10));
        assert_eq!(config.custom_headers().len(), 1);
        assert!(config.use_doc_unwarping());
        assert!(!config.warmup());
    }

    #[test]
    fn test_pipeline_options_reset() {
        let config = PdConfig::default()
            .with_doc_orientation_classify(true)
            .with_textline_orientation(true);
        assert!(config.has_pipeline_options());

        let config = config.without_pipeline_options();
        assert!(!config.has_pipeline_options());
        assert!(!PdConfig::default().has_pipeline_options());
    }
}
