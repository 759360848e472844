use std::future::Future;

use crate::error::AppError;
use crate::filter::ResultFilter;
use crate::models::{Conversation, NewConversation, SearchResult};

/// Queries one web search provider.
///
/// Implementations over-fetch against the remote side, then apply `filter`
/// and the `max_results` cap in provider order (see [`crate::filter::take_filtered`]).
pub trait SearchProvider: Send + Sync {
    /// Stable display name, used in logs and errors.
    fn name(&self) -> &str;

    fn search(
        &self,
        query: &str,
        max_results: usize,
        filter: Option<&dyn ResultFilter>,
    ) -> impl Future<Output = Result<Vec<SearchResult>, AppError>> + Send;
}

/// Fetches raw page content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Converts raw HTML into plain text.
pub trait Cleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// Produces a grounded summary from cleaned page contents.
pub trait Summarizer: Send + Sync {
    /// Returns [`AppError::NoSummary`] when the backend answers with zero candidates.
    fn summarize(
        &self,
        contents: &[String],
        query: &str,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Rewrites a free-form prompt into a concise search query.
pub trait QueryFormulator: Send + Sync {
    fn formulate(&self, prompt: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Persists and retrieves research runs.
pub trait ConversationStore: Send + Sync + Clone {
    /// Save a new conversation. Returns the generated id.
    fn save(
        &self,
        conversation: &NewConversation,
    ) -> impl Future<Output = Result<i64, AppError>> + Send;

    fn get(&self, id: i64) -> impl Future<Output = Result<Option<Conversation>, AppError>> + Send;

    /// Conversations whose summary contains `needle`, newest first.
    fn search(
        &self,
        needle: &str,
    ) -> impl Future<Output = Result<Vec<Conversation>, AppError>> + Send;
}

/// A no-op ConversationStore for use when persistence is not needed.
#[derive(Debug, Clone)]
pub struct NullStore;

impl ConversationStore for NullStore {
    async fn save(&self, _conversation: &NewConversation) -> Result<i64, AppError> {
        Ok(0)
    }

    async fn get(&self, _id: i64) -> Result<Option<Conversation>, AppError> {
        Ok(None)
    }

    async fn search(&self, _needle: &str) -> Result<Vec<Conversation>, AppError> {
        Ok(vec![])
    }
}
