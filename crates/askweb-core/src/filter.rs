//! Client-side result filtering applied by every provider before its cap.

use crate::models::SearchResult;

/// Providers request this many times `max_results` so that filtering can
/// still fill the cap from a single round-trip.
pub const OVER_FETCH_FACTOR: usize = 2;

/// A predicate deciding whether a search result is kept.
pub trait ResultFilter: Send + Sync {
    fn keep(&self, result: &SearchResult) -> bool;
}

impl<F> ResultFilter for F
where
    F: Fn(&SearchResult) -> bool + Send + Sync,
{
    fn keep(&self, result: &SearchResult) -> bool {
        self(result)
    }
}

/// Excludes any result whose URL contains one of the configured substrings.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    blocked: Vec<String>,
}

impl UrlFilter {
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked: blocked
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}

impl ResultFilter for UrlFilter {
    fn keep(&self, result: &SearchResult) -> bool {
        !self.blocked.iter().any(|b| result.url.contains(b.as_str()))
    }
}

/// Number of raw results to request from a provider for a given cap.
pub fn over_fetch(max_results: usize) -> usize {
    max_results.saturating_mul(OVER_FETCH_FACTOR)
}

/// Walk `raw` in provider order, keeping results that pass `filter`, and stop
/// once `max_results` have been collected. The remainder is discarded.
pub fn take_filtered(
    raw: impl IntoIterator<Item = SearchResult>,
    max_results: usize,
    filter: Option<&dyn ResultFilter>,
) -> Vec<SearchResult> {
    let mut kept = Vec::with_capacity(max_results);
    if max_results == 0 {
        return kept;
    }
    for result in raw {
        if filter.is_none_or(|f| f.keep(&result)) {
            kept.push(result);
            if kept.len() == max_results {
                break;
            }
        }
    }
    kept
}
