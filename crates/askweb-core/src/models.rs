use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One hit returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    /// Identity used for deduplication: the URL up to (not including) the first `?`.
    ///
    /// Scheme, host case and trailing slashes are left untouched.
    pub fn dedupe_key(&self) -> &str {
        match self.url.find('?') {
            Some(idx) => &self.url[..idx],
            None => &self.url,
        }
    }
}

/// A persisted research run.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub query: String,
    pub result_urls: Vec<String>,
    pub summary: String,
}

/// DTO for inserting a new conversation into the store.
#[derive(Debug, Clone, Serialize)]
pub struct NewConversation {
    pub query: String,
    pub result_urls: Vec<String>,
    pub summary: String,
}

impl NewConversation {
    pub fn new(query: &str, results: &[SearchResult], summary: &str) -> Self {
        Self {
            query: query.to_string(),
            result_urls: results.iter().map(|r| r.url.clone()).collect(),
            summary: summary.to_string(),
        }
    }

    /// The `results` column value: a JSON array of URL strings.
    pub fn results_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.result_urls)
    }
}
