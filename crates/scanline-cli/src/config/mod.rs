//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, port, shutdown
//! ├── middleware: MiddlewareConfig # CORS, body limit, OpenAPI, timeouts
//! ├── service: ServiceConfig       # PaddleX, OpenAI, image preparation
//! ├── logging: LoggingConfig       # Log output format
//! └── mock: MockOcrConfig          # Mock OCR engine (feature-gated)
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! scanline --paddlex-url http://ocr.internal:8080 --port 8868
//!
//! # Or via environment variables
//! PADDLEX_URL=http://ocr.internal:8080 PORT=8868 scanline
//! ```

mod logging;
mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use logging::LoggingConfig;
pub use middleware::MiddlewareConfig;
use scanline_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "scanline")]
#[command(about = "OCR and ICD-10 extraction server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, OpenAPI, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// OCR engine and analysis configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,

    /// Log output configuration.
    #[clap(flatten)]
    pub logging: LoggingConfig,

    /// Mock OCR engine configuration.
    #[cfg(feature = "mock")]
    #[clap(flatten)]
    pub mock: scanline_test::MockOcrConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so clap's `env` fallbacks can see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "Starting scanline server"
        );

        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration at info level (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            paddlex_url = %self.service.paddlex_url,
            paddlex_auth = self.service.paddlex_api_key.is_some(),
            timeout_secs = self.service.paddlex_timeout_secs,
            max_retries = self.service.paddlex_max_retries,
            max_side = self.service.ocr_max_side,
            warmup = !self.service.ocr_skip_warmup,
            "OCR engine configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            enabled = self.service.openai_api_key().is_some(),
            model = %self.service.openai_model,
            base_url = self.service.openai_base_url.as_deref(),
            "ICD-10 analysis configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
            cfg!(feature = "mock").then_some("mock"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
