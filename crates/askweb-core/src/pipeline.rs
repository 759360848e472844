use futures::future::try_join_all;
use futures::stream::{self, StreamExt};

use crate::dedupe::merge;
use crate::error::AppError;
use crate::filter::{ResultFilter, UrlFilter};
use crate::models::{NewConversation, SearchResult};
use crate::options::Options;
use crate::traits::{Cleaner, ConversationStore, Fetcher, SearchProvider, Summarizer};

/// Progress events emitted while a research run is in flight.
#[derive(Debug)]
pub enum ResearchEvent<'a> {
    Searching {
        query: &'a str,
        providers: usize,
    },
    ProviderDone {
        provider: &'a str,
        results: usize,
    },
    Aggregated {
        results: usize,
    },
    Downloading {
        url: &'a str,
    },
    DownloadFailed {
        url: &'a str,
        error: &'a AppError,
    },
    Summarizing {
        pages: usize,
    },
    Saved {
        id: i64,
    },
}

/// Observer for [`ResearchEvent`]s. Every method has a no-op default.
pub trait ResearchReporter: Send + Sync {
    fn report(&self, event: ResearchEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ResearchReporter for TracingReporter {
    fn report(&self, event: ResearchEvent<'_>) {
        match event {
            ResearchEvent::Searching { query, providers } => {
                tracing::info!(%query, providers, "Searching");
            }
            ResearchEvent::ProviderDone { provider, results } => {
                tracing::info!(%provider, results, "Provider returned");
            }
            ResearchEvent::Aggregated { results } => {
                tracing::info!(results, "Aggregated search results");
            }
            ResearchEvent::Downloading { url } => {
                tracing::debug!(%url, "Downloading");
            }
            ResearchEvent::DownloadFailed { url, error } => {
                tracing::warn!(%url, %error, "Download failed, skipping");
            }
            ResearchEvent::Summarizing { pages } => {
                tracing::info!(pages, "Summarizing content");
            }
            ResearchEvent::Saved { id } => {
                tracing::info!(id, "Conversation saved");
            }
        }
    }
}

/// Result of one research run.
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub query: String,
    /// Aggregated results in provider-priority order.
    pub results: Vec<SearchResult>,
    /// How many pages made it into the grounding content.
    pub pages_used: usize,
    pub summary: String,
    pub conversation_id: Option<i64>,
}

/// Orchestrates a research run: search fan-out → aggregate → download →
/// clean → summarize → save.
///
/// Generic over all external dependencies via traits, so the whole pipeline
/// runs in tests without real HTTP or LLM calls.
pub struct ResearchService<P, F, C, S, St>
where
    P: SearchProvider,
    F: Fetcher,
    C: Cleaner,
    S: Summarizer,
    St: ConversationStore,
{
    providers: Vec<P>,
    fetcher: F,
    cleaner: C,
    summarizer: S,
    store: Option<St>,
    filter: Option<UrlFilter>,
    num_results: usize,
    max_concurrent_downloads: usize,
}

impl<P, F, C, S, St> ResearchService<P, F, C, S, St>
where
    P: SearchProvider,
    F: Fetcher,
    C: Cleaner,
    S: Summarizer,
    St: ConversationStore,
{
    /// Create a service without persistence.
    ///
    /// `providers` must already be in merge priority order.
    pub fn new(providers: Vec<P>, fetcher: F, cleaner: C, summarizer: S, options: &Options) -> Self {
        Self {
            providers,
            fetcher,
            cleaner,
            summarizer,
            store: None,
            filter: options.url_filter(),
            num_results: options.num_results,
            max_concurrent_downloads: options.max_concurrent_downloads.max(1),
        }
    }

    /// Create a service that saves every successful run.
    pub fn with_store(
        providers: Vec<P>,
        fetcher: F,
        cleaner: C,
        summarizer: S,
        store: St,
        options: &Options,
    ) -> Self {
        Self {
            store: Some(store),
            ..Self::new(providers, fetcher, cleaner, summarizer, options)
        }
    }

    /// Query every provider concurrently and merge their lists in priority order.
    ///
    /// The first provider error aborts the search.
    pub async fn search<R: ResearchReporter>(
        &self,
        query: &str,
        reporter: &R,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::EmptyQuery);
        }
        if self.providers.is_empty() {
            return Err(AppError::NoSearchProviders);
        }

        reporter.report(ResearchEvent::Searching {
            query,
            providers: self.providers.len(),
        });

        let filter = self.filter.as_ref().map(|f| f as &dyn ResultFilter);
        let searches = self.providers.iter().map(|provider| async move {
            let results = provider.search(query, self.num_results, filter).await?;
            reporter.report(ResearchEvent::ProviderDone {
                provider: provider.name(),
                results: results.len(),
            });
            Ok::<_, AppError>(results)
        });

        // try_join_all keeps input order, so completion order never leaks
        // into the dedupe tie-break.
        let lists = try_join_all(searches).await?;
        let results: Vec<SearchResult> = merge(lists)
            .into_iter()
            .filter(|r| !r.url.trim().is_empty())
            .collect();

        reporter.report(ResearchEvent::Aggregated {
            results: results.len(),
        });
        Ok(results)
    }

    /// Download and clean every result, at most `max_concurrent_downloads`
    /// at a time. Failed pages are reported and left out.
    pub async fn acquire<R: ResearchReporter>(
        &self,
        results: &[SearchResult],
        reporter: &R,
    ) -> Vec<String> {
        let pages: Vec<Option<String>> = stream::iter(results)
            .map(|result| self.acquire_one(&result.url, reporter))
            .buffered(self.max_concurrent_downloads)
            .collect()
            .await;

        pages.into_iter().flatten().collect()
    }

    async fn acquire_one<R: ResearchReporter>(&self, url: &str, reporter: &R) -> Option<String> {
        reporter.report(ResearchEvent::Downloading { url });

        let text = match self.fetcher.fetch(url).await {
            Ok(html) => self.cleaner.clean(&html),
            Err(e) => Err(e),
        };

        match text {
            Ok(text) if text.is_empty() => {
                tracing::debug!(%url, "Page had no text content");
                None
            }
            Ok(text) => Some(text),
            Err(error) => {
                reporter.report(ResearchEvent::DownloadFailed { url, error: &error });
                None
            }
        }
    }

    /// Run the full pipeline for an already formulated query.
    pub async fn run<R: ResearchReporter>(
        &self,
        query: &str,
        reporter: &R,
    ) -> Result<ResearchOutcome, AppError> {
        let results = self.search(query, reporter).await?;
        let contents = self.acquire(&results, reporter).await;

        reporter.report(ResearchEvent::Summarizing {
            pages: contents.len(),
        });
        let summary = self.summarizer.summarize(&contents, query).await?;

        let conversation_id = match &self.store {
            Some(store) => {
                let id = store
                    .save(&NewConversation::new(query, &results, &summary))
                    .await?;
                reporter.report(ResearchEvent::Saved { id });
                Some(id)
            }
            None => None,
        };

        Ok(ResearchOutcome {
            query: query.to_string(),
            results,
            pages_used: contents.len(),
            summary,
            conversation_id,
        })
    }
}
