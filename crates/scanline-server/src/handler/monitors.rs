//! Liveness and service information handlers.
//!
//! These routes answer even while the OCR engine is unreachable. `/health`
//! asks an initialized engine for its own health, bounded by a short timeout.

use std::collections::BTreeMap;
use std::time::Duration;

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jiff::Timestamp;
use scanline_core::{BoxedOcrProvider, ServiceHealth};

use crate::extract::Json;
use crate::handler::response::{HealthStatus, ProbeStatus, ServiceInfo};
use crate::service::{OcrHandle, ServiceState};

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "scanline_server::handler::monitors";

/// Upper bound on the engine health check made by `/health`.
const ENGINE_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Routes listed by the index handler.
const ENDPOINTS: [(&str, &str); 6] = [
    ("/", "Service information"),
    ("/health", "Health check"),
    ("/test", "Connectivity test"),
    ("/ocr", "POST - Run OCR on a base64-encoded image or PDF"),
    ("/reinit", "POST - Reinitialize the OCR engine"),
    ("/analyze-openai", "POST - Extract ICD-10 codes from text"),
];

/// Reports process liveness and OCR engine state.
#[tracing::instrument(skip_all)]
async fn health_status(State(ocr): State<OcrHandle>) -> (StatusCode, Json<HealthStatus>) {
    let engine = match ocr.current().await {
        Some(provider) => Some(engine_health(&provider).await),
        None => None,
    };

    tracing::debug!(
        target: TRACING_TARGET,
        ocr_initialized = engine.is_some(),
        engine_status = ?engine.as_ref().map(|health| health.status),
        "Health status check requested"
    );

    (StatusCode::OK, Json(HealthStatus::new(engine)))
}

async fn engine_health(provider: &BoxedOcrProvider) -> ServiceHealth {
    let health = match tokio::time::timeout(ENGINE_HEALTH_TIMEOUT, provider.health_check()).await
    {
        Ok(Ok(health)) => health,
        Ok(Err(error)) => ServiceHealth::unhealthy(error.display_message()),
        Err(_) => ServiceHealth::degraded("Engine health check timed out")
            .with_response_time(ENGINE_HEALTH_TIMEOUT),
    };

    if !health.is_operational() {
        tracing::warn!(
            target: TRACING_TARGET,
            message = health.message.as_deref(),
            "OCR engine reports unhealthy"
        );
    }

    health
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get health status")
        .description(
            "Always succeeds while the server runs. Reports whether OCR is ready and, \
             when it is, the engine's own health.",
        )
        .response::<200, Json<HealthStatus>>()
}

/// Describes the service and its routes.
#[tracing::instrument(skip_all)]
async fn service_info(State(ocr): State<OcrHandle>) -> (StatusCode, Json<ServiceInfo>) {
    let endpoints = ENDPOINTS
        .iter()
        .map(|(path, description)| ((*path).to_owned(), (*description).to_owned()))
        .collect::<BTreeMap<_, _>>();

    let info = ServiceInfo {
        message: "OCR server is running".to_owned(),
        ocr_initialized: ocr.is_initialized().await,
        endpoints,
    };

    (StatusCode::OK, Json(info))
}

fn service_info_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get service information")
        .description("Lists available endpoints and the OCR engine state.")
        .response::<200, Json<ServiceInfo>>()
}

/// Answers a connectivity probe.
async fn probe() -> (StatusCode, Json<ProbeStatus>) {
    tracing::trace!(target: TRACING_TARGET, "Connectivity probe");

    let status = ProbeStatus {
        message: "Server is responding".to_owned(),
        timestamp: Timestamp::now(),
    };

    (StatusCode::OK, Json(status))
}

fn probe_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Test connectivity")
        .description("Returns a fixed message with the server time.")
        .response::<200, Json<ProbeStatus>>()
}

/// Returns a [`Router`] with all health monitoring routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/", get_with(service_info, service_info_docs))
        .api_route("/health", get_with(health_status, health_status_docs))
        .api_route("/test", get_with(probe, probe_docs))
        .with_path_items(|item| item.tag("Monitors"))
}
