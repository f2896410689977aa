//! Client for the NIH Clinical Tables ICD-10-CM search API.
//!
//! The API answers `GET ?terms=...` with a four-element array:
//! `[total, [codes], extra, [display]]`, where each display entry is either a
//! string or a `[code, name]` array depending on the requested fields.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::CodeLookup;
use super::code::{lookup_candidates, normalize_code};
use crate::{Error, Result, TRACING_TARGET_LOOKUP};

/// Default values for configuration options.
mod defaults {
    /// Search endpoint for ICD-10-CM.
    pub const BASE_URL: &str = "https://clinicaltables.nlm.nih.gov/api/icd10cm/v3/search";

    /// Per-request timeout in seconds.
    pub const TIMEOUT_SECS: u64 = 10;

    /// Maximum number of matches requested per search.
    pub const MAX_LIST: u32 = 5;
}

/// Field-selection parameters tried for every candidate, in order.
const FIELD_PARAMS: [&str; 2] = ["df", "sf"];

/// Fields requested from the API.
const FIELDS: &str = "code,name";

/// Configuration for [`ClinicalTablesClient`].
#[derive(Debug, Clone)]
pub struct ClinicalTablesConfig {
    /// Search endpoint URL.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum number of matches per search.
    pub max_list: u32,
}

impl Default for ClinicalTablesConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(defaults::BASE_URL).expect("default URL is valid"),
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            max_list: defaults::MAX_LIST,
        }
    }
}

impl ClinicalTablesConfig {
    /// Sets the search endpoint.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Looks up ICD-10-CM descriptions with a few query variants per code.
#[derive(Debug, Clone)]
pub struct ClinicalTablesClient {
    http: Client,
    config: ClinicalTablesConfig,
}

impl ClinicalTablesClient {
    /// Creates a client with the given configuration.
    pub fn new(config: ClinicalTablesConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("scanline-openai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Runs a single search and returns the raw response body.
    async fn search(&self, term: &str, field_param: &str) -> Result<Value> {
        let max_list = self.config.max_list.to_string();
        let response = self
            .http
            .get(self.config.base_url.clone())
            .query(&[
                ("terms", term),
                (field_param, FIELDS),
                ("maxList", max_list.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait::async_trait]
impl CodeLookup for ClinicalTablesClient {
    async fn describe(&self, code: &str) -> Option<String> {
        let normalized = normalize_code(code);

        for candidate in lookup_candidates(code) {
            for field_param in FIELD_PARAMS {
                match self.search(&candidate, field_param).await {
                    Ok(body) => {
                        if let Some(name) = pick_description(&body, &normalized, &candidate) {
                            tracing::debug!(
                                target: TRACING_TARGET_LOOKUP,
                                code = %normalized,
                                term = %candidate,
                                "Resolved code description"
                            );
                            return Some(name);
                        }
                    }
                    Err(err) => {
                        tracing::debug!(
                            target: TRACING_TARGET_LOOKUP,
                            code = %normalized,
                            term = %candidate,
                            field_param,
                            error = %err,
                            "Code lookup request failed"
                        );
                    }
                }
            }
        }

        None
    }
}

/// Picks a description from a search response.
///
/// An entry whose code equals the normalized code or the search term wins;
/// otherwise the first non-empty name is used.
fn pick_description(body: &Value, normalized: &str, candidate: &str) -> Option<String> {
    let parts = body.as_array()?;
    let display = parts.get(3).and_then(Value::as_array);
    let codes = parts.get(1).and_then(Value::as_array);

    let entries: Vec<(Option<&str>, Option<&str>)> = match display {
        Some(display) => display
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let listed = codes.and_then(|codes| codes.get(i)).and_then(Value::as_str);
                display_entry(entry, listed)
            })
            .collect(),
        None => Vec::new(),
    };

    let matches = |code: &str| {
        let code = code.trim().to_uppercase();
        code == normalized || code == candidate.to_uppercase()
    };

    entries
        .iter()
        .find(|(code, name)| code.is_some_and(|c| matches(c)) && name.is_some_and(|n| !n.is_empty()))
        .or_else(|| entries.iter().find(|(_, name)| name.is_some_and(|n| !n.is_empty())))
        .and_then(|(_, name)| name.map(|name| name.trim().to_owned()))
}

/// Splits a display entry into `(code, name)`.
fn display_entry<'a>(entry: &'a Value, listed: Option<&'a str>) -> (Option<&'a str>, Option<&'a str>) {
    match entry {
        Value::Array(fields) => {
            let code = fields.first().and_then(Value::as_str).or(listed);
            let name = fields
                .get(1)
                .or_else(|| fields.last())
                .and_then(Value::as_str);
            (code, name)
        }
        Value::String(name) => (listed, Some(name.as_str())),
        _ => (listed, None),
    }
}
