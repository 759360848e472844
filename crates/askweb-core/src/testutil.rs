//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::error::AppError;
use crate::filter::{ResultFilter, take_filtered};
use crate::models::{Conversation, NewConversation, SearchResult};
use crate::traits::{Cleaner, ConversationStore, Fetcher, QueryFormulator, SearchProvider, Summarizer};

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// Mock search provider with a canned raw result list.
///
/// Applies the filter and cap exactly like a real provider does.
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    raw: Vec<SearchResult>,
    error: Arc<Mutex<Option<AppError>>>,
    delay: Option<Duration>,
    /// Recorded calls: (query, max_results).
    pub calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockProvider {
    pub fn new(name: &str, urls: &[&str]) -> Self {
        let raw = urls
            .iter()
            .enumerate()
            .map(|(i, url)| SearchResult::new(format!("{name} result {i}"), *url, "snippet"))
            .collect();
        Self {
            name: name.to_string(),
            raw,
            error: Arc::new(Mutex::new(None)),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(name: &str, error: AppError) -> Self {
        let provider = Self::new(name, &[]);
        *provider.error.lock().unwrap() = Some(error);
        provider
    }

    /// Sleep before answering, to shuffle completion order in fan-out tests.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SearchProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
        filter: Option<&dyn ResultFilter>,
    ) -> Result<Vec<SearchResult>, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(take_filtered(self.raw.clone(), max_results, filter))
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher with per-URL responses.
///
/// URLs without a configured response return a small HTML page naming the URL.
/// Every call is recorded, in call order.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<Mutex<HashMap<String, Result<String, AppError>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(html.to_string()));
        self
    }

    pub fn with_failure(self, url: &str, error: AppError) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(error));
        self
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let configured = self.pages.lock().unwrap().remove(url);
        configured.unwrap_or_else(|| Ok(format!("<p>content of {url}</p>")))
    }
}

// ---------------------------------------------------------------------------
// MockCleaner
// ---------------------------------------------------------------------------

/// Mock cleaner that applies a simple transformation.
#[derive(Clone)]
pub struct MockCleaner {
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockCleaner {
    /// Creates a cleaner that returns the input unchanged.
    pub fn passthrough() -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a cleaner whose first call fails.
    pub fn with_error(error: AppError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl Cleaner for MockCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        let mut err = self.error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        Ok(html.to_string())
    }
}

// ---------------------------------------------------------------------------
// MockSummarizer
// ---------------------------------------------------------------------------

/// Mock summarizer that records the grounding content it was given.
#[derive(Clone)]
pub struct MockSummarizer {
    response: Arc<Mutex<Option<Result<String, AppError>>>>,
    /// Recorded calls: (contents, query).
    pub calls: Arc<Mutex<Vec<(Vec<String>, String)>>>,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Ok(summary.to_string())))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Err(error)))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn received_contents(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(contents, _)| contents.clone())
            .unwrap_or_default()
    }
}

impl Summarizer for MockSummarizer {
    async fn summarize(&self, contents: &[String], query: &str) -> Result<String, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((contents.to_vec(), query.to_string()));
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok("default summary".to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockFormulator
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct MockFormulator {
    response: Arc<Mutex<Option<Result<String, AppError>>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl MockFormulator {
    pub fn new(query: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Ok(query.to_string())))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Err(error)))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl QueryFormulator for MockFormulator {
    async fn formulate(&self, prompt: &str) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(prompt.to_string()))
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory conversation store; ids are 1-based insertion positions.
#[derive(Clone)]
pub struct MockStore {
    pub saved: Arc<Mutex<Vec<NewConversation>>>,
    save_error: Arc<Mutex<Option<AppError>>>,
}

impl MockStore {
    pub fn empty() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            save_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Store that returns an error on save.
    pub fn with_save_error(error: AppError) -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            save_error: Arc::new(Mutex::new(Some(error))),
        }
    }

    fn to_conversation(id: usize, new: &NewConversation) -> Conversation {
        Conversation {
            id: id as i64,
            timestamp: Utc::now().naive_utc(),
            query: new.query.clone(),
            result_urls: new.result_urls.clone(),
            summary: new.summary.clone(),
        }
    }
}

impl ConversationStore for MockStore {
    async fn save(&self, conversation: &NewConversation) -> Result<i64, AppError> {
        let mut err = self.save_error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(conversation.clone());
        Ok(saved.len() as i64)
    }

    async fn get(&self, id: i64) -> Result<Option<Conversation>, AppError> {
        let saved = self.saved.lock().unwrap();
        let found = usize::try_from(id)
            .ok()
            .filter(|&i| i >= 1)
            .and_then(|i| saved.get(i - 1).map(|c| Self::to_conversation(i, c)));
        Ok(found)
    }

    async fn search(&self, needle: &str) -> Result<Vec<Conversation>, AppError> {
        let saved = self.saved.lock().unwrap();
        Ok(saved
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, c)| c.summary.contains(needle))
            .map(|(i, c)| Self::to_conversation(i + 1, c))
            .collect())
    }
}
