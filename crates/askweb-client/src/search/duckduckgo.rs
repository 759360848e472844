//! DuckDuckGo via its JavaScript-free HTML endpoint. Needs no credentials.
//!
//! One results page already holds more entries than any sensible cap, so the
//! page itself is the over-fetch.

use std::time::Duration;

use askweb_core::error::AppError;
use askweb_core::filter::{ResultFilter, take_filtered};
use askweb_core::models::SearchResult;
use askweb_core::query::query_string;
use askweb_core::traits::SearchProvider;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::send_checked;
use crate::http::{BROWSER_USER_AGENT, build_client};

pub const DUCKDUCKGO_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// No region bias.
const REGION: &str = "wt-wt";

const NAME: &str = "DuckDuckGo";

#[derive(Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout, BROWSER_USER_AGENT)?,
            endpoint: DUCKDUCKGO_ENDPOINT.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        filter: Option<&dyn ResultFilter>,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::EmptyQuery);
        }

        let url = format!(
            "{}?{}",
            self.endpoint,
            query_string(&[("q", query), ("kl", REGION)])
        );
        tracing::debug!(%query, "DuckDuckGo search");

        let request = self
            .client
            .get(&url)
            .header("Accept-Language", "en-US,en;q=0.9");
        let html = send_checked(request, NAME, self.timeout_secs).await?;
        tracing::trace!(bytes = html.len(), "DuckDuckGo response received");

        let raw = parse_results(&html)?;
        Ok(take_filtered(raw, max_results, filter))
    }
}

/// Extract every organic result from a results page, in page order.
///
/// Ads and entries without a title link are skipped.
pub(crate) fn parse_results(html: &str) -> Result<Vec<SearchResult>, AppError> {
    let document = Html::parse_document(html);

    let result_sel = selector(
        ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)",
    )?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();
    for element in document.select(&result_sel) {
        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };

        let title = normalize_text(title_el.text());
        if title.is_empty() {
            continue;
        }

        let Some(url) = title_el.value().attr("href").and_then(extract_url) else {
            continue;
        };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| normalize_text(el.text()))
            .unwrap_or_default();

        results.push(SearchResult::new(title, url, snippet));
    }

    if results.is_empty() && !html.trim().is_empty() {
        tracing::warn!(bytes = html.len(), "DuckDuckGo page had no recognizable results");
    } else {
        tracing::debug!(count = results.len(), "DuckDuckGo results parsed");
    }
    Ok(results)
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::SearchError {
        provider: NAME.to_string(),
        status_code: None,
        message: format!("invalid selector {css:?}: {e:?}"),
    })
}

fn normalize_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unwrap DuckDuckGo's `//duckduckgo.com/l/?uddg=<target>` redirect links.
fn extract_url(href: &str) -> Option<String> {
    let full_href = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&full_href).ok()?;
    if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
            .filter(|target| !target.is_empty())
    } else {
        Some(full_href)
    }
}
