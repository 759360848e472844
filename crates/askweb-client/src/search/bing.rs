use std::time::Duration;

use askweb_core::error::AppError;
use askweb_core::filter::{ResultFilter, over_fetch, take_filtered};
use askweb_core::models::SearchResult;
use askweb_core::query::query_string;
use askweb_core::traits::SearchProvider;
use reqwest::Client;
use serde::Deserialize;

use super::{parse_json, send_checked};
use crate::http::{CLIENT_USER_AGENT, build_client};

pub const BING_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/custom/search";

/// Largest `count` the Custom Search API accepts.
const BING_MAX_COUNT: usize = 50;

const NAME: &str = "Bing";

/// Bing Custom Search v7.
#[derive(Clone)]
pub struct BingSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    config_key: String,
    timeout_secs: u64,
}

impl BingSearch {
    pub fn new(api_key: &str, config_key: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout, CLIENT_USER_AGENT)?,
            endpoint: BING_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            config_key: config_key.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<WebPages>,
}

#[derive(Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<BingItem>,
}

#[derive(Deserialize)]
struct BingItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
}

impl SearchProvider for BingSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        filter: Option<&dyn ResultFilter>,
    ) -> Result<Vec<SearchResult>, AppError> {
        let count = over_fetch(max_results).clamp(1, BING_MAX_COUNT).to_string();
        let url = format!(
            "{}?{}",
            self.endpoint,
            query_string(&[
                ("q", query),
                ("count", count.as_str()),
                ("customConfig", self.config_key.as_str()),
                ("safeSearch", "Off"),
            ])
        );
        tracing::debug!(%query, %count, "Bing search");

        let request = self
            .client
            .get(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key);
        let body = send_checked(request, NAME, self.timeout_secs).await?;
        let response: BingResponse = parse_json(&body, NAME)?;

        let raw = response
            .web_pages
            .map(|pages| pages.value)
            .unwrap_or_default()
            .into_iter()
            .map(|item| SearchResult::new(item.name, item.url, item.snippet));
        Ok(take_filtered(raw, max_results, filter))
    }
}
