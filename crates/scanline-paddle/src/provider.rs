//! [`OcrProvider`] integration for the PaddleX client.

use std::sync::Arc;
use std::time::Instant;

use scanline_core::{
    BoxedOcrProvider, OcrInput, OcrProvider, OcrProviderFactory, PreparedImage, Result,
    ServiceHealth, warmup_image,
};
use serde_json::Value;

use crate::{PROVIDER_TARGET, PdClient, PdConfig};

#[async_trait::async_trait]
impl OcrProvider for PdClient {
    async fn predict(&self, input: OcrInput) -> Result<Vec<Value>> {
        Ok(self.infer(&input).await?)
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let started = Instant::now();
        let health = match PdClient::health_check(self).await {
            Ok(()) => ServiceHealth::healthy(),
            Err(err) => ServiceHealth::unhealthy(err.to_string()),
        };

        Ok(health.with_response_time(started.elapsed()))
    }
}

/// Runs one prediction on a blank image.
async fn warm_up(client: &PdClient, image: &PreparedImage) -> crate::Result<()> {
    let started = Instant::now();
    client.infer(&OcrInput::image(image)).await?;

    tracing::debug!(
        target: PROVIDER_TARGET,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Warmup inference completed"
    );
    Ok(())
}

#[async_trait::async_trait]
impl OcrProviderFactory for PdConfig {
    /// Builds a client and checks that the service answers.
    ///
    /// When warmup fails with optional pipeline stages enabled, it is retried
    /// once with all of them disabled, and the provider keeps the reduced
    /// configuration if that succeeds.
    async fn create(&self) -> Result<BoxedOcrProvider> {
        let client = PdClient::new(self.clone())?;

        PdClient::health_check(&client).await?;
        tracing::info!(
            target: PROVIDER_TARGET,
            base_url = %self.base_url(),
            "PaddleX service is reachable"
        );

        if !self.warmup() {
            return Ok(Arc::new(client));
        }

        let image = warmup_image()?;
        let err = match warm_up(&client, &image).await {
            Ok(()) => return Ok(Arc::new(client)),
            Err(err) => err,
        };

        if !self.has_pipeline_options() {
            tracing::warn!(target: PROVIDER_TARGET, error = %err, "Warmup inference failed");
            return Ok(Arc::new(client));
        }

        tracing::warn!(
            target: PROVIDER_TARGET,
            error = %err,
            "Warmup failed with optional pipeline stages, retrying without them"
        );

        let fallback = PdClient::new(self.clone().without_pipeline_options())?;
        match warm_up(&fallback, &image).await {
            Ok(()) => {
                tracing::info!(
                    target: PROVIDER_TARGET,
                    "Using PaddleX pipeline without optional stages"
                );
                Ok(Arc::new(fallback))
            }
            Err(err) => {
                tracing::warn!(target: PROVIDER_TARGET, error = %err, "Warmup inference failed");
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::Json;
    use axum::Router;
    use axum::routing::{get, post};
    use scanline_core::{ErrorKind, FileKind};
    use serde_json::json;

    use super::*;

    fn unreachable_config() -> PdConfig {
        // Port 9 (discard) is not served on test hosts.
        PdConfig::new("http://127.0.0.1:9")
            .unwrap()
            .with_max_retries(0)
            .with_warmup(false)
    }

    /// Serves a pipeline that fails whenever text line orientation is requested.
    async fn serve_orientation_sensitive(calls: Arc<AtomicUsize>) -> PdConfig {
        let pipeline = post(move |Json(body): Json<Value>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if body["useTextlineOrientation"] == true {
                    Json(json!({ "errorCode": 500, "errorMsg": "model not loaded" }))
                } else {
                    Json(json!({
                        "errorCode": 0,
                        "result": { "ocrResults": [{ "prunedResult": { "rec_texts": [] } }] }
                    }))
                }
            }
        });
        let router = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/ocr", pipeline);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });

        PdConfig::new(format!("http://{addr}"))
            .unwrap()
            .with_max_retries(0)
            .with_retry_backoff(Duration::from_millis(10))
    }

    fn blank_input() -> OcrInput {
        OcrInput::image(&warmup_image().unwrap())
    }

    #[tokio::test]
    async fn test_factory_fails_when_service_is_down() {
        let result = unreachable_config().create().await;
        let err = result.err().expect("factory should fail");
        assert!(matches!(
            err.kind(),
            ErrorKind::NetworkError | ErrorKind::Timeout | ErrorKind::ServiceUnavailable
        ));
    }

    #[tokio::test]
    async fn test_health_reports_unhealthy_when_service_is_down() {
        let client = PdClient::new(unreachable_config()).unwrap();
        let health = OcrProvider::health_check(&client).await.unwrap();
        assert!(!health.is_operational());
        assert!(health.response_ms.is_some());
    }

    #[tokio::test]
    async fn test_warmup_falls_back_to_default_pipeline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = serve_orientation_sensitive(calls.clone())
            .await
            .with_textline_orientation(true);

        let provider = config.create().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let pages = provider.predict(blank_input()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(scanline_core::normalize_pages(FileKind::Image, &pages).len(), 0);
    }

    #[tokio::test]
    async fn test_warmup_without_options_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = serve_orientation_sensitive(calls.clone()).await;

        let provider = config.create().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(provider.predict(blank_input()).await.is_ok());
    }
}
