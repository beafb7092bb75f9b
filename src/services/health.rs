// src/services/health.rs

//! Backend health probe.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::endpoint;
use crate::utils::http::fetch_json;

/// Body of `GET /health`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub openai_available: Option<bool>,
    #[serde(default)]
    pub supabase_available: Option<bool>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// Probe the backend's health route.
pub async fn check_health(
    client: &Client,
    base_url: &str,
    timeout: Duration,
) -> Result<HealthStatus> {
    let url = endpoint(base_url, "/health")?;
    let value = fetch_json(client, url, timeout).await?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_health_body() {
        let health: HealthStatus = serde_json::from_str(
            r#"{"status":"healthy","version":"2.0.0","openai_available":false,
                "supabase_available":true,"timestamp":"2025-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.version.as_deref(), Some("2.0.0"));
        assert_eq!(health.openai_available, Some(false));
    }

    #[tokio::test]
    async fn unreachable_backend_is_error() {
        let result = check_health(
            &Client::new(),
            "http://127.0.0.1:9",
            Duration::from_millis(500),
        )
        .await;
        assert!(result.is_err());
    }
}
