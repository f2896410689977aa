//! Chat-completions client with rate limiting.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, MonotonicClock};
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use url::Url;

use super::chat::{ChatMessage, ChatRequest, ChatResponse};
use super::llm_config::LlmConfig;
use crate::{Error, Result, TRACING_TARGET_CLIENT};

/// Anything that can turn a conversation into a completion.
///
/// [`LlmClient`] is the production implementation; tests substitute canned
/// replies.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the text of the first completion choice.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String>;
}

/// OpenAI-compatible chat-completions client.
///
/// Cloning is cheap; clones share the HTTP connection pool and the rate
/// limiter.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    endpoint: Url,
    config: LlmConfig,
    rate_limiter: RateLimiter<
        NotKeyed,
        InMemoryState,
        MonotonicClock,
        NoOpMiddleware<<MonotonicClock as Clock>::Instant>,
    >,
}

impl LlmClient {
    /// Creates a new client from a configuration.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.api_key()))
            .map_err(|e| Error::config(format!("Invalid API key: {e}")))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let http = Client::builder()
            .timeout(config.effective_request_timeout())
            .user_agent(concat!("scanline-openai/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let endpoint = completions_endpoint(config.effective_base_url())?;

        let rate_limiter = RateLimiter::new(
            Quota::per_second(config.effective_rate_limit()),
            InMemoryState::default(),
            MonotonicClock,
        );

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            endpoint = %endpoint,
            model = config.effective_model(),
            rate_limit = config.effective_rate_limit().get(),
            "Chat-completions client initialized"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                endpoint,
                config,
                rate_limiter,
            }),
        })
    }

    /// Creates a new client from an API key with default settings.
    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self> {
        let config = LlmConfig::builder().with_api_key(api_key).build()?;
        Self::new(config)
    }

    /// Returns a reference to the client's configuration.
    pub fn as_config(&self) -> &LlmConfig {
        &self.inner.config
    }

    /// Returns the resolved `chat/completions` URL.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Sends a chat-completions request using the configured model settings.
    pub async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse> {
        self.inner.rate_limiter.until_ready().await;

        let config = &self.inner.config;
        let request = ChatRequest {
            model: config.effective_model().to_owned(),
            messages,
            max_tokens: config.effective_max_tokens(),
            temperature: config.effective_temperature(),
        };

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat-completions request"
        );

        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body = response.json::<ChatResponse>().await.map_err(|e| {
                Error::invalid_response(format!("Failed to parse completion response: {e}"))
            })?;

            tracing::info!(
                target: TRACING_TARGET_CLIENT,
                model = body.model.as_deref().unwrap_or_default(),
                total_tokens = body.usage.map(|usage| usage.total_tokens).unwrap_or_default(),
                "Chat-completions request succeeded"
            );

            return Ok(body);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.unwrap_or_default();
        let message = api_error_message(&body).unwrap_or_else(|| status.to_string());

        tracing::warn!(
            target: TRACING_TARGET_CLIENT,
            status = status.as_u16(),
            error = %message,
            "Chat-completions request failed"
        );

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimit {
                message,
                retry_after,
            },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait::async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let response = self.chat_completion(messages).await?;
        response
            .first_content()
            .map(str::to_owned)
            .ok_or_else(|| Error::invalid_response("Completion contained no message content"))
    }
}

impl fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Resolves `chat/completions` relative to the base URL, keeping its path.
fn completions_endpoint(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)
        .map_err(|e| Error::config(format!("Invalid base URL '{base_url}': {e}")))?;

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join("chat/completions")
        .map_err(|e| Error::config(format!("Failed to construct API URL: {e}")))
}

/// Extracts `error.message` from an OpenAI error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}
