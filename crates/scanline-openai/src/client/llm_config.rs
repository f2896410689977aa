//! Configuration for the chat-completions client.

use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use derive_builder::Builder;

/// Default values for configuration options.
mod defaults {
    /// Default rate limit (requests per second).
    pub const RATE_LIMIT: u32 = 5;

    /// Default request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Default model for completions.
    pub const MODEL: &str = "gpt-4o";

    /// Default maximum tokens for responses.
    pub const MAX_TOKENS: u32 = 2000;

    /// Default sampling temperature.
    pub const TEMPERATURE: f32 = 0.3;

    /// OpenAI API base URL.
    pub const BASE_URL: &str = "https://api.openai.com/v1/";
}

fn validate_config(builder: &LlmConfigBuilder) -> Result<(), String> {
    if let Some(api_key) = &builder.api_key
        && api_key.trim().is_empty()
    {
        return Err("API key must not be empty".to_owned());
    }

    if let Some(Some(temperature)) = builder.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(format!(
            "Temperature must be between 0.0 and 2.0, got {temperature}"
        ));
    }

    if let Some(Some(0)) = builder.max_tokens {
        return Err("Max tokens must be greater than 0".to_owned());
    }

    if let Some(Some(base_url)) = &builder.base_url
        && !base_url.starts_with("http://")
        && !base_url.starts_with("https://")
    {
        return Err(format!(
            "Base URL must start with http:// or https://, got {base_url}"
        ));
    }

    Ok(())
}

/// Configuration for [`LlmClient`].
///
/// # Examples
///
/// ```rust
/// use scanline_openai::LlmConfig;
///
/// let config = LlmConfig::builder()
///     .with_api_key("sk-test")
///     .with_model("gpt-4o-mini")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.effective_model(), "gpt-4o-mini");
/// ```
///
/// [`LlmClient`]: crate::LlmClient
#[derive(Clone, Builder)]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "validate_config")
)]
pub struct LlmConfig {
    /// API key sent as a bearer token.
    api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[builder(default)]
    base_url: Option<String>,

    /// Model used for completions.
    #[builder(default)]
    model: Option<String>,

    /// Maximum tokens in a completion.
    #[builder(default)]
    max_tokens: Option<u32>,

    /// Sampling temperature (0.0-2.0).
    #[builder(default)]
    temperature: Option<f32>,

    /// Maximum requests per second.
    #[builder(default)]
    rate_limit: Option<NonZeroU32>,

    /// Timeout for a single request.
    #[builder(default)]
    request_timeout: Option<Duration>,
}

impl LlmConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> LlmConfigBuilder {
        LlmConfigBuilder::default()
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the effective base URL.
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(defaults::BASE_URL)
    }

    /// Returns the effective model.
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(defaults::MODEL)
    }

    /// Returns the effective maximum tokens.
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(defaults::MAX_TOKENS)
    }

    /// Returns the effective temperature.
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(defaults::TEMPERATURE)
    }

    /// Returns the effective rate limit in requests per second.
    pub fn effective_rate_limit(&self) -> NonZeroU32 {
        self.rate_limit
            .unwrap_or(NonZeroU32::new(defaults::RATE_LIMIT).unwrap_or(NonZeroU32::MIN))
    }

    /// Returns the effective request timeout.
    pub fn effective_request_timeout(&self) -> Duration {
        self.request_timeout
            .unwrap_or(Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS))
    }

    /// Returns the API key with everything past the first four characters masked.
    pub fn masked_api_key(&self) -> String {
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{visible}****")
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.effective_base_url())
            .field("model", &self.effective_model())
            .field("max_tokens", &self.effective_max_tokens())
            .field("temperature", &self.effective_temperature())
            .field("rate_limit", &self.effective_rate_limit())
            .field("request_timeout", &self.effective_request_timeout())
            .finish()
    }
}
