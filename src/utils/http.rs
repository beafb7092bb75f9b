// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::ApiConfig;

/// Create a configured asynchronous HTTP client.
///
/// No client-wide timeout: every request carries its own deadline.
pub fn create_async_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()?;
    Ok(client)
}

/// GET a URL and parse the body as JSON within `timeout`.
///
/// Non-2xx responses and blank bodies are errors.
pub async fn fetch_json(client: &reqwest::Client, url: Url, timeout: Duration) -> Result<Value> {
    let label = url.to_string();
    let request = async {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::status(&label, status.as_u16()));
        }
        let body = response.bytes().await?;
        parse_json_body(&label, &body)
    };

    with_deadline(&label, timeout, request).await
}

/// Run a future under a deadline, mapping expiry to `AppError::Timeout`.
pub async fn with_deadline<T>(
    label: &str,
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| AppError::timeout(label, timeout.as_millis() as u64))?
}

/// Parse a JSON body, treating a blank body as empty rather than malformed.
pub fn parse_json_body(label: &str, body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::EmptyPayload(label.to_string()));
    }
    Ok(serde_json::from_slice(body)?)
}

/// Extract a human-readable message from an error response body.
///
/// Understands `{"detail": ...}`, `{"message": ...}`, `{"error_description": ...}`,
/// `{"msg": ...}` and `{"error": ...}`.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        ["detail", "message", "error_description", "msg", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });
    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status.to_string()
        } else {
            trimmed.chars().take(200).collect()
        }
    })
}
