#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use scanline_server::handler::routes;
use scanline_server::middleware::{
    RouterObservabilityExt, RouterOpenApiExt, RouterRecoveryExt, RouterSecurityExt,
};
use scanline_server::service::ServiceState;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "scanline_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "scanline_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "scanline_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    cli.logging.init_tracing();
    cli.log();
    cli.validate()?;

    let state = create_service_state(&cli).await?;
    let router = create_router(state, &cli.middleware);

    server::serve(router, cli.server).await?;

    Ok(())
}

/// Creates the service state, connecting to the OCR engine.
///
/// An unreachable engine is logged and left for `POST /reinit`.
async fn create_service_state(cli: &Cli) -> anyhow::Result<ServiceState> {
    #[cfg(feature = "mock")]
    let state = {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Using the mock OCR engine, results are synthetic"
        );
        let factory = std::sync::Arc::new(scanline_test::MockOcrFactory::new(cli.mock.clone()));
        ServiceState::with_factory(&cli.service, factory).await
    };

    #[cfg(not(feature = "mock"))]
    let state = ServiceState::from_config(&cli.service).await;

    let state = state.context("failed to create service state")?;

    if !state.ocr().is_initialized().await {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "OCR engine is unavailable, /ocr will fail until POST /reinit succeeds"
        );
    }

    Ok(state)
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. Security - CORS, security headers, body limits
/// 4. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    let api_routes: Router = routes()
        .with_open_api(middleware.openapi.clone())
        .with_state(state);

    api_routes
        .with_security(&middleware.security)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
