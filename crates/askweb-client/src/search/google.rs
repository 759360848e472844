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

pub const GOOGLE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The Custom Search API refuses `num` above this.
const GOOGLE_MAX_NUM: usize = 10;

const NAME: &str = "Google";

/// Google Programmable Search (Custom Search JSON API).
#[derive(Clone)]
pub struct GoogleSearch {
    client: Client,
    endpoint: String,
    api_key: String,
    cse_id: String,
    timeout_secs: u64,
}

impl GoogleSearch {
    pub fn new(api_key: &str, cse_id: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout, CLIENT_USER_AGENT)?,
            endpoint: GOOGLE_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            cse_id: cse_id.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SearchProvider for GoogleSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        filter: Option<&dyn ResultFilter>,
    ) -> Result<Vec<SearchResult>, AppError> {
        let num = over_fetch(max_results).clamp(1, GOOGLE_MAX_NUM).to_string();
        let url = format!(
            "{}?{}",
            self.endpoint,
            query_string(&[
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
        );
        tracing::debug!(%query, %num, "Google search");

        let request = self
            .client
            .get(&url)
            .header("X-goog-api-key", &self.api_key);
        let body = send_checked(request, NAME, self.timeout_secs).await?;
        let response: GoogleResponse = parse_json(&body, NAME)?;

        let raw = response
            .items
            .into_iter()
            .map(|item| SearchResult::new(item.title, item.link, item.snippet));
        Ok(take_filtered(raw, max_results, filter))
    }
}
