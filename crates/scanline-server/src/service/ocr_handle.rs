//! Shared handle to the OCR engine.
//!
//! The handle starts empty and is filled once the engine answers a probe.
//! Initialization failures are logged and leave the slot as it was, so the
//! server keeps serving health checks and can be repaired through
//! `POST /reinit` without a restart.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use scanline_core::{BoxedOcrProvider, OcrProviderFactory};
use tokio::sync::{Mutex, RwLock};

use crate::service::TRACING_TARGET;

/// Lazily initialized, replaceable OCR provider.
///
/// This type is `Clone` and all clones share the same provider slot.
#[derive(Clone)]
pub struct OcrHandle {
    /// Current provider, `None` until initialization succeeds.
    provider: Arc<RwLock<Option<BoxedOcrProvider>>>,
    /// Builds and probes new providers.
    factory: Arc<dyn OcrProviderFactory>,
    /// Serializes initialization so concurrent reinit requests don't race.
    init_lock: Arc<Mutex<()>>,
}

impl OcrHandle {
    /// Creates an empty handle backed by the given factory.
    pub fn new(factory: Arc<dyn OcrProviderFactory>) -> Self {
        Self {
            provider: Arc::new(RwLock::new(None)),
            factory,
            init_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a provider and stores it, returning whether it succeeded.
    pub async fn initialize(&self) -> bool {
        let _guard = self.init_lock.lock().await;
        self.install_provider().await
    }

    /// Creates a new provider and swaps it in place of the current one.
    ///
    /// The current provider stays in the slot until its replacement is
    /// ready, and is kept when the replacement cannot be created. Requests
    /// that already hold the previous provider finish with it.
    pub async fn reinitialize(&self) -> bool {
        let _guard = self.init_lock.lock().await;
        self.install_provider().await
    }

    /// Returns the current provider, if initialized.
    pub async fn current(&self) -> Option<BoxedOcrProvider> {
        self.provider.read().await.clone()
    }

    /// Returns whether a provider is currently available.
    pub async fn is_initialized(&self) -> bool {
        self.provider.read().await.is_some()
    }

    async fn install_provider(&self) -> bool {
        let started = Instant::now();
        tracing::info!(target: TRACING_TARGET, "Initializing OCR engine");

        match self.factory.create().await {
            Ok(provider) => {
                let replaced = self.provider.write().await.replace(provider).is_some();
                tracing::info!(
                    target: TRACING_TARGET,
                    replaced,
                    elapsed_ms = started.elapsed().as_millis(),
                    "OCR engine initialized",
                );
                true
            }
            Err(error) => {
                let kept_previous = self.is_initialized().await;
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    kept_previous,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Failed to initialize OCR engine",
                );
                false
            }
        }
    }
}

impl fmt::Debug for OcrHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let initialized = self
            .provider
            .try_read()
            .map(|slot| slot.is_some())
            .unwrap_or_default();

        f.debug_struct("OcrHandle")
            .field("initialized", &initialized)
            .finish_non_exhaustive()
    }
}
