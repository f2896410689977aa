//! Engine health reports.
//!
//! Providers answer [`OcrProvider::health_check`] with a [`ServiceHealth`],
//! which the server embeds in its own health endpoint.
//!
//! [`OcrProvider::health_check`]: crate::OcrProvider::health_check

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Operational status of a service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Answering normally.
    #[default]
    Healthy,
    /// Reachable state unknown, e.g. the check did not finish in time.
    Degraded,
    /// Not answering.
    Unhealthy,
}

/// Outcome of a single engine health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ServiceHealth {
    /// Engine status.
    pub status: ServiceStatus,
    /// How long the check took, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_ms: Option<u64>,
    /// Why the engine is not healthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the check ran.
    pub checked_at: Timestamp,
}

impl ServiceHealth {
    fn with_status(status: ServiceStatus, message: Option<String>) -> Self {
        Self {
            status,
            response_ms: None,
            message,
            checked_at: Timestamp::now(),
        }
    }

    /// The engine answered its health check.
    pub fn healthy() -> Self {
        Self::with_status(ServiceStatus::Healthy, None)
    }

    /// The engine state could not be determined.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ServiceStatus::Degraded, Some(message.into()))
    }

    /// The engine failed its health check.
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ServiceStatus::Unhealthy, Some(message.into()))
    }

    /// Records how long the check took.
    pub fn with_response_time(mut self, elapsed: Duration) -> Self {
        self.response_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Returns true unless the engine is unhealthy.
    pub fn is_operational(&self) -> bool {
        self.status != ServiceStatus::Unhealthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_report_omits_optional_fields() {
        let health = ServiceHealth::healthy();
        assert!(health.is_operational());

        let value = serde_json::to_value(&health).unwrap();
        assert_eq!(value["status"], "healthy");
        assert!(value.get("message").is_none());
        assert!(value.get("response_ms").is_none());
    }

    #[test]
    fn degraded_is_still_operational() {
        let health = ServiceHealth::degraded("slow").with_response_time(Duration::from_millis(1500));
        assert!(health.is_operational());
        assert_eq!(health.response_ms, Some(1500));
        assert_eq!(health.message.as_deref(), Some("slow"));
    }

    #[test]
    fn unhealthy_is_not_operational() {
        let health = ServiceHealth::unhealthy("connection refused");
        assert!(!health.is_operational());
        assert_eq!(
            serde_json::to_value(&health).unwrap()["status"],
            "unhealthy"
        );
    }
}
