//! Shared reqwest plumbing for every outbound call.

use std::time::Duration;

use askweb_core::error::AppError;
use reqwest::Client;

/// User-Agent for API calls.
pub const CLIENT_USER_AGENT: &str = concat!("ask-web/", env!("CARGO_PKG_VERSION"));

/// Browser-like User-Agent for endpoints that serve HTML to people.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Longest response body excerpt carried into an error message.
const BODY_SNIPPET_CHARS: usize = 200;

pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::HttpError(format!("failed to build HTTP client: {e}")))
}

/// Classify a failed `send()`.
pub fn send_error(e: reqwest::Error, timeout_secs: u64) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout_secs)
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}

/// First characters of a response body, on one line.
pub fn body_snippet(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
