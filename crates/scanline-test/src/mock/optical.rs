//! Mock OCR engine for testing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[cfg(feature = "config")]
use clap::Args;
use scanline_core::{
    BoxedOcrProvider, Error, FileKind, OcrInput, OcrProvider, OcrProviderFactory, Result,
    ServiceHealth,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Configuration for the mock OCR engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockOcrConfig {
    /// Text recognized on every page.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MOCK_OCR_TEXT", default_value = "MOCK OCR TEXT")
    )]
    pub mock_text: String,

    /// Confidence reported for the recognized text.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MOCK_OCR_CONFIDENCE", default_value = "0.98")
    )]
    pub mock_confidence: f64,
}

impl Default for MockOcrConfig {
    fn default() -> Self {
        Self {
            mock_text: "MOCK OCR TEXT".to_owned(),
            mock_confidence: 0.98,
        }
    }
}

/// Mock OCR provider for testing.
///
/// Answers every page with one line of text in the parallel-array layout the
/// PaddleX pipeline uses. PDF page counts are read from the document.
#[derive(Debug, Clone, Default)]
pub struct MockOcrProvider {
    config: MockOcrConfig,
    failure: Option<String>,
    pages: Option<Vec<Value>>,
    calls: Arc<AtomicUsize>,
}

impl MockOcrProvider {
    /// Creates a new mock provider with the given configuration.
    pub fn new(config: MockOcrConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Creates a provider whose predictions always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Creates a provider that answers every prediction with `pages` as-is.
    pub fn returning(pages: Vec<Value>) -> Self {
        Self {
            pages: Some(pages),
            ..Default::default()
        }
    }

    /// Number of `predict` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn page(&self, index: usize) -> Value {
        json!({
            "page_index": index,
            "prunedResult": {
                "rec_texts": [self.config.mock_text],
                "rec_scores": [self.config.mock_confidence],
                "rec_polys": [[[10, 10], [110, 10], [110, 30], [10, 30]]],
            }
        })
    }
}

#[async_trait::async_trait]
impl OcrProvider for MockOcrProvider {
    async fn predict(&self, input: OcrInput) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(Error::external_error().with_message(message.clone()));
        }

        if let Some(pages) = &self.pages {
            return Ok(pages.clone());
        }

        let pages = match input.kind {
            FileKind::Image => 1,
            FileKind::Pdf => lopdf::Document::load_mem(&input.bytes)
                .map(|doc| doc.get_pages().len())
                .unwrap_or(1),
        };

        Ok((0..pages).map(|index| self.page(index)).collect())
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(match &self.failure {
            Some(message) => ServiceHealth::unhealthy(message.clone()),
            None => ServiceHealth::healthy(),
        })
    }
}

/// Factory producing [`MockOcrProvider`]s, with a switch to simulate an
/// unreachable engine.
#[derive(Debug, Clone, Default)]
pub struct MockOcrFactory {
    template: MockOcrProvider,
    unavailable: Arc<AtomicBool>,
    created: Arc<AtomicUsize>,
}

impl MockOcrFactory {
    /// Creates a factory for providers with the given configuration.
    pub fn new(config: MockOcrConfig) -> Self {
        Self::from_provider(MockOcrProvider::new(config))
    }

    /// Creates a factory that hands out clones of `provider`.
    ///
    /// Clones share the call counter of `provider`.
    pub fn from_provider(provider: MockOcrProvider) -> Self {
        Self {
            template: provider,
            ..Default::default()
        }
    }

    /// Creates a factory whose `create` calls fail until re-enabled.
    pub fn unavailable() -> Self {
        let factory = Self::default();
        factory.set_unavailable(true);
        factory
    }

    /// Toggles the simulated engine outage. Clones share the switch.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of providers created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl OcrProviderFactory for MockOcrFactory {
    async fn create(&self) -> Result<BoxedOcrProvider> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::service_unavailable().with_message("Mock OCR engine is unavailable"));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.template.clone()))
    }
}
