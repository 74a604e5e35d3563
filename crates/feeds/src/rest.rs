//! Shared REST plumbing for provider clients.

use crate::error::FeedError;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout for upstream calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by all provider clients.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, FeedError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("buyalert-bot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FeedError::RequestFailed(e.to_string()))
}

/// GET a URL and decode the body as JSON.
///
/// Non-success statuses and undecodable bodies are errors.
pub async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value, FeedError> {
    debug!(url = url, "GET");
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::from_status(status.as_u16()));
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Join a base URL and a path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
