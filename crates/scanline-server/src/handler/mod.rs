//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use scanline_server::handler::routes;
//! use scanline_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let state = ServiceState::from_config(&config).await?;
//! let router: aide::axum::ApiRouter = routes().with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod analysis;
mod error;
mod monitors;
mod ocr;
pub mod request;
pub mod response;

use aide::axum::ApiRouter;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::ErrorResponse;
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns an [`ApiRouter`] with all routes.
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(monitors::routes())
        .merge(ocr::routes())
        .merge(analysis::routes())
        .fallback(handler)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use aide::axum::ApiRouter;
    use aide::openapi::OpenApi;
    use axum::Extension;
    use axum_test::TestServer;
    use scanline_test::{MockOcrConfig, MockOcrFactory};

    use crate::handler::routes;
    use crate::service::{ServiceConfig, ServiceState};

    /// Returns a new [`ServiceState`] backed by a healthy mock OCR engine.
    pub async fn create_test_state() -> anyhow::Result<ServiceState> {
        let factory = MockOcrFactory::new(MockOcrConfig::default());
        create_test_state_with_factory(factory).await
    }

    /// Returns a new [`ServiceState`] backed by the given mock OCR factory.
    pub async fn create_test_state_with_factory(
        factory: MockOcrFactory,
    ) -> anyhow::Result<ServiceState> {
        let config = ServiceConfig::default();
        let state = ServiceState::with_factory(&config, Arc::new(factory)).await?;
        Ok(state)
    }

    /// Returns a new [`TestServer`] with the given router.
    pub async fn create_test_server_with_router(
        router: impl Fn(ServiceState) -> ApiRouter<ServiceState>,
    ) -> anyhow::Result<TestServer> {
        let state = create_test_state().await?;
        let router = router(state.clone());
        create_test_server_with_state(router, state).await
    }

    /// Returns a new [`TestServer`] with the given router and OCR factory.
    pub async fn create_test_server_with_factory(
        factory: MockOcrFactory,
        router: impl Fn(ServiceState) -> ApiRouter<ServiceState>,
    ) -> anyhow::Result<TestServer> {
        let state = create_test_state_with_factory(factory).await?;
        let router = router(state.clone());
        create_test_server_with_state(router, state).await
    }

    /// Returns a new [`TestServer`] with the given router and state.
    pub async fn create_test_server_with_state(
        router: ApiRouter<ServiceState>,
        state: ServiceState,
    ) -> anyhow::Result<TestServer> {
        let mut api = OpenApi::default();
        let app = router
            .with_state(state)
            .finish_api(&mut api)
            .layer(Extension(api));
        let server = TestServer::new(app)?;
        Ok(server)
    }

    /// Returns a new [`TestServer`] with the default router and state.
    pub async fn create_test_server() -> anyhow::Result<TestServer> {
        create_test_server_with_router(|_| routes()).await
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let server = create_test_server().await?;
        assert!(server.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route_returns_not_found() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server.get("/does-not-exist").await;
        response.assert_status_not_found();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["name"], "not_found");

        Ok(())
    }
}
