//! Web search providers.
//!
//! Every provider over-fetches from its remote side (see
//! [`askweb_core::filter::over_fetch`]), then applies the result filter and
//! the cap client-side in the order the remote returned results.

mod bing;
mod duckduckgo;
mod google;

pub use bing::{BING_ENDPOINT, BingSearch};
pub use duckduckgo::{DUCKDUCKGO_ENDPOINT, DuckDuckGoSearch};
pub use google::{GOOGLE_ENDPOINT, GoogleSearch};

use askweb_core::error::AppError;
use askweb_core::filter::ResultFilter;
use askweb_core::models::SearchResult;
use askweb_core::traits::SearchProvider;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::http::{body_snippet, send_error};

/// The closed set of supported search providers.
#[derive(Clone)]
pub enum Provider {
    Google(GoogleSearch),
    DuckDuckGo(DuckDuckGoSearch),
    Bing(BingSearch),
}

impl SearchProvider for Provider {
    fn name(&self) -> &str {
        match self {
            Provider::Google(p) => p.name(),
            Provider::DuckDuckGo(p) => p.name(),
            Provider::Bing(p) => p.name(),
        }
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        filter: Option<&dyn ResultFilter>,
    ) -> Result<Vec<SearchResult>, AppError> {
        match self {
            Provider::Google(p) => p.search(query, max_results, filter).await,
            Provider::DuckDuckGo(p) => p.search(query, max_results, filter).await,
            Provider::Bing(p) => p.search(query, max_results, filter).await,
        }
    }
}

/// Send a provider request and return the body of a 2xx response.
///
/// Transport failures and non-2xx statuses become [`AppError::SearchError`]
/// with the provider name, status and a body excerpt.
pub(crate) async fn send_checked(
    request: RequestBuilder,
    provider: &str,
    timeout_secs: u64,
) -> Result<String, AppError> {
    let response = request.send().await.map_err(|e| AppError::SearchError {
        provider: provider.to_string(),
        status_code: None,
        message: send_error(e, timeout_secs).to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| AppError::SearchError {
        provider: provider.to_string(),
        status_code: Some(status.as_u16()),
        message: format!("failed to read response body: {e}"),
    })?;

    if !status.is_success() {
        return Err(AppError::SearchError {
            provider: provider.to_string(),
            status_code: Some(status.as_u16()),
            message: format!("HTTP {}: {}", status.as_u16(), body_snippet(&body)),
        });
    }

    Ok(body)
}

/// Decode a JSON provider body, reporting malformed bodies with context.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &str, provider: &str) -> Result<T, AppError> {
    serde_json::from_str(body).map_err(|e| AppError::SearchError {
        provider: provider.to_string(),
        status_code: None,
        message: format!("malformed response ({e}): {}", body_snippet(body)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_reports_malformed_body() {
        #[derive(serde::Deserialize, Debug)]
        struct Body {
            #[allow(dead_code)]
            items: Vec<String>,
        }
        let err = parse_json::<Body>("<html>oops</html>", "Google").unwrap_err();
        match err {
            AppError::SearchError { provider, message, .. } => {
                assert_eq!(provider, "Google");
                assert!(message.contains("malformed response"));
                assert!(message.contains("<html>oops</html>"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_provider_names() {
        let ddg = Provider::DuckDuckGo(DuckDuckGoSearch::new(std::time::Duration::from_secs(5)).unwrap());
        assert_eq!(ddg.name(), "DuckDuckGo");
    }
}
