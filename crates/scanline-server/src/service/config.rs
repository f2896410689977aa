use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use scanline_openai::{
    ClinicalTablesClient, ClinicalTablesConfig, CodingService, LlmClient, LlmConfig,
};
use scanline_paddle::PdConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::service::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Default PaddleX serving endpoint.
    pub const PADDLEX_URL: &str = "http://127.0.0.1:8080";

    /// Default OCR request timeout in seconds.
    pub const PADDLEX_TIMEOUT_SECS: u64 = 120;

    /// Default number of retries for transient engine failures.
    pub const PADDLEX_MAX_RETRIES: u32 = 3;

    /// Default longest image side before downscaling.
    pub const OCR_MAX_SIDE: u32 = scanline_core::DEFAULT_MAX_SIDE;

    /// Default model for ICD-10 analysis.
    pub const OPENAI_MODEL: &str = "gpt-4o";
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Base URL of the PaddleX OCR serving endpoint.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PADDLEX_URL", default_value = defaults::PADDLEX_URL)
    )]
    pub paddlex_url: String,

    /// Bearer token for the PaddleX endpoint.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PADDLEX_API_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub paddlex_api_key: Option<String>,

    /// Timeout for a single OCR request in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PADDLEX_TIMEOUT_SECS", default_value_t = defaults::PADDLEX_TIMEOUT_SECS)
    )]
    pub paddlex_timeout_secs: u64,

    /// Retries for transient OCR engine failures.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "PADDLEX_MAX_RETRIES", default_value_t = defaults::PADDLEX_MAX_RETRIES)
    )]
    pub paddlex_max_retries: u32,

    /// Longest image side in pixels before downscaling; `0` disables it.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OCR_MAX_SIDE", default_value_t = defaults::OCR_MAX_SIDE)
    )]
    pub ocr_max_side: u32,

    /// Enables text line orientation classification in the OCR pipeline.
    #[cfg_attr(feature = "config", arg(long, env = "OCR_TEXTLINE_ORIENTATION"))]
    pub ocr_textline_orientation: bool,

    /// Skips the warmup inference after connecting to the OCR engine.
    #[cfg_attr(feature = "config", arg(long, env = "OCR_SKIP_WARMUP"))]
    pub ocr_skip_warmup: bool,

    /// OpenAI API key; ICD-10 analysis is disabled without it.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAI_API_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Model used for ICD-10 analysis.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OPENAI_MODEL", default_value = defaults::OPENAI_MODEL)
    )]
    pub openai_model: String,

    /// Base URL of an OpenAI-compatible API.
    #[cfg_attr(feature = "config", arg(long, env = "OPENAI_BASE_URL"))]
    pub openai_base_url: Option<String>,

    /// Clinical Tables ICD-10-CM search endpoint.
    #[cfg_attr(feature = "config", arg(long, env = "CLINICAL_TABLES_URL"))]
    pub clinical_tables_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            paddlex_url: defaults::PADDLEX_URL.to_owned(),
            paddlex_api_key: None,
            paddlex_timeout_secs: defaults::PADDLEX_TIMEOUT_SECS,
            paddlex_max_retries: defaults::PADDLEX_MAX_RETRIES,
            ocr_max_side: defaults::OCR_MAX_SIDE,
            ocr_textline_orientation: false,
            ocr_skip_warmup: false,
            openai_api_key: None,
            openai_model: defaults::OPENAI_MODEL.to_owned(),
            openai_base_url: None,
            clinical_tables_url: None,
        }
    }
}

impl ServiceConfig {
    /// Validates all configuration values and returns errors for invalid settings.
    pub fn validate(&self) -> Result<()> {
        parse_url("PaddleX URL", &self.paddlex_url)?;

        if self.paddlex_timeout_secs == 0 {
            return Err(Error::config("PaddleX timeout must be at least 1 second"));
        }

        if self.openai_model.trim().is_empty() {
            return Err(Error::config("OpenAI model cannot be empty"));
        }

        if let Some(base_url) = &self.openai_base_url {
            parse_url("OpenAI base URL", base_url)?;
        }

        if let Some(lookup_url) = &self.clinical_tables_url {
            parse_url("Clinical Tables URL", lookup_url)?;
        }

        Ok(())
    }

    /// Returns the configured OpenAI API key, ignoring blank values.
    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Builds the PaddleX client configuration, which doubles as the OCR
    /// provider factory.
    pub fn paddle_config(&self) -> Result<PdConfig> {
        let mut config = PdConfig::new(&self.paddlex_url)?
            .with_timeout(Duration::from_secs(self.paddlex_timeout_secs))
            .with_max_retries(self.paddlex_max_retries)
            .with_textline_orientation(self.ocr_textline_orientation)
            .with_warmup(!self.ocr_skip_warmup);

        if let Some(api_key) = self.paddlex_api_key.as_deref().filter(|key| !key.is_empty()) {
            config = config.with_api_key(api_key);
        }

        Ok(config)
    }

    /// Builds the ICD-10 analysis service, or `None` without an API key.
    pub fn coding_service(&self) -> Result<Option<CodingService>> {
        let Some(api_key) = self.openai_api_key() else {
            return Ok(None);
        };

        let llm_config = {
            let mut builder = LlmConfig::builder()
                .with_api_key(api_key)
                .with_model(self.openai_model.clone());
            if let Some(base_url) = &self.openai_base_url {
                builder = builder.with_base_url(base_url.clone());
            }
            builder.build()
        }
        .map_err(scanline_openai::Error::from)?;

        let llm_client = LlmClient::new(llm_config)?;

        let mut lookup_config = ClinicalTablesConfig::default();
        if let Some(lookup_url) = &self.clinical_tables_url {
            lookup_config = lookup_config.with_base_url(parse_url("Clinical Tables URL", lookup_url)?);
        }
        let lookup = ClinicalTablesClient::new(lookup_config)?;

        Ok(Some(CodingService::new(
            Arc::new(llm_client),
            Arc::new(lookup),
        )))
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| Error::config(format!("{name} is invalid: {value}")).with_source(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ocr_max_side, 1280);
    }

    #[test]
    fn invalid_paddlex_url_is_rejected() {
        let config = ServiceConfig {
            paddlex_url: "not a url".to_owned(),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_api_key_disables_analysis() {
        let config = ServiceConfig {
            openai_api_key: Some("   ".to_owned()),
            ..ServiceConfig::default()
        };
        assert!(config.openai_api_key().is_none());
        assert!(config.coding_service().unwrap().is_none());
    }

    #[test]
    fn api_key_enables_analysis() {
        let config = ServiceConfig {
            openai_api_key: Some("sk-test".to_owned()),
            ..ServiceConfig::default()
        };
        assert!(config.coding_service().unwrap().is_some());
    }

    #[test]
    fn paddle_config_follows_settings() {
        let config = ServiceConfig {
            paddlex_url: "http://ocr.internal:8080".to_owned(),
            paddlex_timeout_secs: 30,
            ocr_skip_warmup: true,
            ..ServiceConfig::default()
        };

        let paddle = config.paddle_config().unwrap();
        assert_eq!(paddle.base_url().as_str(), "http://ocr.internal:8080/");
        assert_eq!(paddle.timeout(), Duration::from_secs(30));
        assert!(!paddle.warmup());
    }

    #[test]
    fn api_keys_are_not_serialized() {
        let config = ServiceConfig {
            openai_api_key: Some("sk-secret".to_owned()),
            paddlex_api_key: Some("pd-secret".to_owned()),
            ..ServiceConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
