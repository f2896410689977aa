//! Application state and dependency injection.

use std::sync::Arc;

use scanline_core::OcrProviderFactory;
use scanline_openai::CodingService;

use crate::service::{CodingHandle, OcrHandle, Result, ServiceConfig, TRACING_TARGET};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    ocr: OcrHandle,
    coding: CodingHandle,
    config: ServiceConfig,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to the PaddleX engine and builds the ICD-10 analysis service.
    /// An unreachable engine does not fail startup; the OCR handle stays
    /// empty until `POST /reinit` succeeds.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;
        let factory = Arc::new(config.paddle_config()?);
        Self::with_factory(config, factory).await
    }

    /// Initializes application state with a custom OCR provider factory.
    pub async fn with_factory(
        config: &ServiceConfig,
        factory: Arc<dyn OcrProviderFactory>,
    ) -> Result<Self> {
        let coding = CodingHandle::new(config.coding_service()?);
        if !coding.is_configured() {
            tracing::warn!(
                target: TRACING_TARGET,
                "OpenAI API key not configured, ICD-10 analysis is disabled"
            );
        }

        let ocr = OcrHandle::new(factory);
        ocr.initialize().await;

        Ok(Self {
            ocr,
            coding,
            config: config.clone(),
        })
    }

    /// Replaces the ICD-10 analysis service.
    pub fn with_coding_service(mut self, service: CodingService) -> Self {
        self.coding = CodingHandle::from(service);
        self
    }

    /// Returns the OCR engine handle.
    pub fn ocr(&self) -> &OcrHandle {
        &self.ocr
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(ocr: OcrHandle);
impl_di!(coding: CodingHandle);
impl_di!(config: ServiceConfig);

#[cfg(test)]
mod tests {
    use scanline_test::{MockOcrConfig, MockOcrFactory, create_mock_coding_service};

    use super::*;

    #[tokio::test]
    async fn state_initializes_ocr_from_factory() -> anyhow::Result<()> {
        let factory = Arc::new(MockOcrFactory::new(MockOcrConfig::default()));
        let state = ServiceState::with_factory(&ServiceConfig::default(), factory).await?;

        assert!(state.ocr().is_initialized().await);
        Ok(())
    }

    #[tokio::test]
    async fn state_survives_unavailable_engine() -> anyhow::Result<()> {
        let factory = Arc::new(MockOcrFactory::unavailable());
        let state = ServiceState::with_factory(&ServiceConfig::default(), factory).await?;

        assert!(!state.ocr().is_initialized().await);
        Ok(())
    }

    #[tokio::test]
    async fn coding_service_is_optional() -> anyhow::Result<()> {
        let factory = Arc::new(MockOcrFactory::new(MockOcrConfig::default()));
        let state = ServiceState::with_factory(&ServiceConfig::default(), factory).await?;
        assert!(!state.coding.is_configured());

        let state = state.with_coding_service(create_mock_coding_service("{}"));
        assert!(state.coding.is_configured());
        Ok(())
    }
}
