//! Monitor response types.

use std::collections::BTreeMap;

use jiff::Timestamp;
use scanline_core::{ServiceHealth, ServiceStatus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Liveness report.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthStatus {
    /// Always `healthy` while the process serves requests.
    pub status: ServiceStatus,
    /// Whether an OCR engine connection is in place.
    pub ocr_initialized: bool,
    /// Result of the engine health check, absent while uninitialized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<ServiceHealth>,
    /// Application version.
    pub version: String,
    /// Timestamp when this status was generated.
    pub checked_at: Timestamp,
}

impl HealthStatus {
    /// Creates a report for the current process.
    pub fn new(engine: Option<ServiceHealth>) -> Self {
        Self {
            status: ServiceStatus::Healthy,
            ocr_initialized: engine.is_some(),
            engine,
            version: env!("CARGO_PKG_VERSION").to_owned(),
            checked_at: Timestamp::now(),
        }
    }
}

/// Service description returned by the index route.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ServiceInfo {
    /// Greeting.
    pub message: String,
    /// Whether an OCR engine connection is in place.
    pub ocr_initialized: bool,
    /// Available routes and what they do.
    pub endpoints: BTreeMap<String, String>,
}

/// Connectivity probe answer.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProbeStatus {
    /// Fixed message.
    pub message: String,
    /// Server time.
    pub timestamp: Timestamp,
}
