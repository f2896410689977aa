//! PaddleX HTTP client implementation.

use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use scanline_core::{FileKind, OcrInput};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use super::pd_types::{FILE_TYPE_IMAGE, FILE_TYPE_PDF, InferRequest, InferResponse};
use crate::{Error, PADDLEX_TARGET, PdConfig, Result};

/// HTTP client for a PaddleX OCR serving endpoint.
///
/// # Examples
///
/// ```no_run
/// use scanline_core::OcrInput;
/// use scanline_paddle::{PdClient, PdConfig};
///
/// # async fn example(pdf: bytes::Bytes) -> Result<(), scanline_paddle::Error> {
/// let client = PdClient::new(PdConfig::new("http://localhost:8080")?)?;
/// let pages = client.infer(&OcrInput::pdf(pdf)).await?;
/// println!("{} pages recognized", pages.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PdClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: PdConfig,
}

impl PdClient {
    /// Create a new PaddleX client with the given configuration.
    pub fn new(config: PdConfig) -> Result<Self> {
        let mut client_builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .danger_accept_invalid_certs(!config.verify_ssl());

        let mut headers = HeaderMap::new();
        for (key, value) in config.custom_headers() {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::config(format!("Invalid header name '{}': {}", key, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("Invalid header value '{}': {}", value, e)))?;
            headers.insert(header_name, header_value);
        }

        if let Some(api_key) = config.api_key() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| Error::config(format!("Invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if !headers.is_empty() {
            client_builder = client_builder.default_headers(headers);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            target: PADDLEX_TARGET,
            base_url = %config.base_url(),
            timeout = ?config.timeout(),
            "PaddleX client initialized"
        );

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &PdConfig {
        &self.config
    }

    /// Run the OCR pipeline and return one raw payload per page.
    ///
    /// Each payload is `{"page_index": i, "prunedResult": {...}}`.
    pub async fn infer(&self, input: &OcrInput) -> Result<Vec<Value>> {
        let url = self.config.endpoint()?;
        let request = self.build_request(input);

        debug!(
            target: PADDLEX_TARGET,
            url = %url,
            kind = %input.kind,
            size = input.bytes.len(),
            "Submitting file to OCR pipeline"
        );

        let started = Instant::now();
        let response = self.execute_with_retry(&url, &request).await?;

        let pages: Vec<Value> = response
            .result
            .unwrap_or_default()
            .ocr_results
            .into_iter()
            .enumerate()
            .map(|(index, page)| json!({ "page_index": index, "prunedResult": page.pruned_result }))
            .collect();

        info!(
            target: PADDLEX_TARGET,
            log_id = response.log_id.as_deref().unwrap_or_default(),
            pages = pages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "OCR pipeline completed"
        );

        Ok(pages)
    }

    fn build_request(&self, input: &OcrInput) -> InferRequest {
        InferRequest {
            file: STANDARD.encode(&input.bytes),
            file_type: match input.kind {
                FileKind::Pdf => FILE_TYPE_PDF,
                FileKind::Image => FILE_TYPE_IMAGE,
            },
            use_doc_orientation_classify: self.config.use_doc_orientation_classify(),
            use_doc_unwarping: self.config.use_doc_unwarping(),
            use_textline_orientation: self.config.use_textline_orientation(),
            visualize: false,
        }
    }

    /// Execute a request with automatic retry on retryable errors.
    async fn execute_with_retry(
        &self,
        url: &url::Url,
        request: &InferRequest,
    ) -> Result<InferResponse> {
        let mut attempt = 0;
        let max_retries = self.config.max_retries();

        loop {
            let result = async {
                let response = self
                    .http_client
                    .post(url.clone())
                    .json(request)
                    .send()
                    .await?;

                self.handle_response(response).await
            }
            .await;

            match result {
                Ok(response) => {
                    if attempt > 0 {
                        info!(
                            target: PADDLEX_TARGET,
                            attempt = attempt + 1,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    let backoff = self.config.retry_backoff() * attempt;

                    warn!(
                        target: PADDLEX_TARGET,
                        attempt = attempt,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Request failed, retrying"
                    );

                    let delay = e.retry_after().unwrap_or(backoff);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        target: PADDLEX_TARGET,
                        attempt = attempt + 1,
                        error = %e,
                        "Request failed permanently"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Handle HTTP response and convert to result.
    async fn handle_response(&self, response: reqwest::Response) -> Result<InferResponse> {
        let status = response.status();

        debug!(
            target: PADDLEX_TARGET,
            status = status.as_u16(),
            "Received response from PaddleX"
        );

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(std::time::Duration::from_secs);

        let body = response.text().await?;
        let envelope = serde_json::from_str::<InferResponse>(&body).ok();

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(Error::rate_limit("Rate limit exceeded", retry_after));
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                return Err(Error::service_unavailable(
                    "Service temporarily unavailable",
                    retry_after,
                ));
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                return Err(Error::timeout(self.config.timeout()));
            }
            _ => {}
        }

        match envelope {
            Some(envelope) if status.is_success() && envelope.error_code == 0 => Ok(envelope),
            Some(envelope) => Err(Error::api(
                status.as_u16(),
                envelope
                    .error_msg
                    .unwrap_or_else(|| "Unknown error".to_string()),
                Some(envelope.error_code),
            )),
            None if status.is_success() => Err(Error::invalid_response(
                "Response is not a PaddleX result envelope",
                Some(body),
            )),
            None => Err(Error::api(status.as_u16(), body, None)),
        }
    }

    /// Health check for the PaddleX service.
    pub async fn health_check(&self) -> Result<()> {
        let url = self.config.health_endpoint()?;

        debug!(target: PADDLEX_TARGET, url = %url, "Performing health check");

        let response = self.http_client.get(url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::service_unavailable(
                format!("Health check failed with status {}", response.status()),
                None,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::Router;
    use axum::http::StatusCode as HttpStatus;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use bytes::Bytes;

    use super::*;

    /// Canned replies served in order; the last one repeats.
    #[derive(Clone)]
    struct Script {
        replies: Arc<Vec<(HttpStatus, Option<&'static str>, &'static str)>>,
        hits: Arc<AtomicUsize>,
    }

    impl Script {
        fn new(replies: Vec<(HttpStatus, Option<&'static str>, &'static str)>) -> Self {
            Self {
                replies: Arc::new(replies),
                hits: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        fn reply(&self) -> Response {
            let hit = self.hits.fetch_add(1, Ordering::SeqCst);
            let (status, retry_after, body) = self.replies[hit.min(self.replies.len() - 1)];
            let mut response = (status, body).into_response();
            if let Some(seconds) = retry_after {
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from_static(seconds));
            }
            response
        }
    }

    /// Serves `script` on the pipeline path of a local port.
    async fn serve(script: Script) -> PdConfig {
        let router = Router::new().route(
            "/ocr",
            post(move || {
                let script = script.clone();
                async move { script.reply() }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });

        PdConfig::new(format!("http://{addr}"))
            .unwrap()
            .with_retry_backoff(Duration::from_millis(10))
            .with_warmup(false)
    }

    fn image_input() -> OcrInput {
        OcrInput {
            kind: FileKind::Image,
            bytes: Bytes::from_static(b"png"),
        }
    }

    const SUCCESS: &str = r#"{
        "logId": "1",
        "errorCode": 0,
        "errorMsg": "Success",
        "result": {"ocrResults": [{"prunedResult": {"rec_texts": ["hello"]}}]}
    }"#;

    #[test]
    fn test_client_creation() {
        let config = PdConfig::new("http://localhost:8080")
            .unwrap()
            .with_timeout(Duration::from_secs(60))
            .with_api_key("test-key");

        let client = PdClient::new(config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_invalid_config() {
        let config = PdConfig::new("http://localhost:8080")
            .unwrap()
            .with_header("Invalid\nHeader", "value");

        let result = PdClient::new(config);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_body() {
        let config = PdConfig::default().with_textline_orientation(true);
        let client = PdClient::new(config).unwrap();

        let request = client.build_request(&OcrInput::pdf(Bytes::from_static(b"%PDF-1.5")));
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["file"], "JVBERi0xLjU=");
        assert_eq!(body["fileType"], 0);
        assert_eq!(body["useTextlineOrientation"], true);
        assert_eq!(body["useDocUnwarping"], false);
        assert_eq!(body["visualize"], false);
    }

    #[test]
    fn test_envelope_parsing() {
        let body = r#"{
            "logId": "abc",
            "errorCode": 0,
            "errorMsg": "Success",
            "result": {
                "ocrResults": [
                    {"prunedResult": {"rec_texts": ["a"], "rec_scores": [0.9]}, "ocrImage": null}
                ],
                "dataInfo": {"width": 64, "height": 64, "type": "image"}
            }
        }"#;

        let envelope: InferResponse = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error_code, 0);
        let results = envelope.result.unwrap().ocr_results;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].pruned_result["rec_texts"][0], "a");
    }

    #[tokio::test]
    async fn test_infer_tags_pages() {
        let script = Script::new(vec![(HttpStatus::OK, None, SUCCESS)]);
        let client = PdClient::new(serve(script.clone()).await).unwrap();

        let pages = client.infer(&image_input()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0]["page_index"], 0);
        assert_eq!(pages[0]["prunedResult"]["rec_texts"][0], "hello");
        assert_eq!(script.hits(), 1);
    }

    #[tokio::test]
    async fn test_nonzero_error_code_is_api_error() {
        let body = r#"{"logId": "2", "errorCode": 500, "errorMsg": "Inference failed"}"#;
        let script = Script::new(vec![(HttpStatus::OK, None, body)]);
        let client = PdClient::new(serve(script.clone()).await).unwrap();

        let err = client.infer(&image_input()).await.unwrap_err();
        match err {
            Error::Api {
                status,
                message,
                code,
            } => {
                assert_eq!(status, 200);
                assert_eq!(message, "Inference failed");
                assert_eq!(code, Some(500));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(script.hits(), 1);
    }

    #[tokio::test]
    async fn test_success_without_envelope_is_invalid_response() {
        let script = Script::new(vec![(HttpStatus::OK, None, r#"{"texts": ["hello"]}"#)]);
        let client = PdClient::new(serve(script.clone()).await).unwrap();

        let err = client.infer(&image_input()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse { body: Some(_), .. }));
        assert!(!err.is_retryable());
        assert_eq!(script.hits(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_is_retried_until_success() {
        let script = Script::new(vec![
            (HttpStatus::SERVICE_UNAVAILABLE, None, "busy"),
            (HttpStatus::BAD_GATEWAY, None, "busy"),
            (HttpStatus::OK, None, SUCCESS),
        ]);
        let client = PdClient::new(serve(script.clone()).await).unwrap();

        let pages = client.infer(&image_input()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(script.hits(), 3);
    }

    #[tokio::test]
    async fn test_retry_after_overrides_backoff() {
        let script = Script::new(vec![
            (HttpStatus::TOO_MANY_REQUESTS, Some("0"), "slow down"),
            (HttpStatus::OK, None, SUCCESS),
        ]);
        let config = serve(script.clone())
            .await
            .with_retry_backoff(Duration::from_secs(60));
        let client = PdClient::new(config).unwrap();

        let pages = tokio::time::timeout(Duration::from_secs(10), client.infer(&image_input()))
            .await
            .expect("Retry-After of zero should skip the backoff")
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(script.hits(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_retries() {
        let script = Script::new(vec![(HttpStatus::TOO_MANY_REQUESTS, Some("7"), "slow down")]);
        let config = serve(script.clone()).await.with_max_retries(0);
        let client = PdClient::new(config).unwrap();

        let err = client.infer(&image_input()).await.unwrap_err();
        assert!(matches!(err, Error::RateLimit { .. }));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(script.hits(), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let script = Script::new(vec![(HttpStatus::BAD_GATEWAY, None, "down")]);
        let config = serve(script.clone()).await.with_max_retries(2);
        let client = PdClient::new(config).unwrap();

        let err = client.infer(&image_input()).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable { .. }));
        assert_eq!(script.hits(), 3);
    }
}
