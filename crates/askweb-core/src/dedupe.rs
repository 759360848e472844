//! Merging of provider result lists.
//!
//! Results are keyed by [`SearchResult::dedupe_key`] (URL minus query string).
//! The first occurrence wins, so the order in which provider lists are
//! concatenated acts as the tie-break between providers. This is lossy on
//! purpose: two URLs that differ only in their query string are one page as
//! far as the pipeline is concerned.

use std::collections::HashSet;

use crate::models::SearchResult;

/// Drop later results whose normalized URL has already been seen.
pub fn dedupe(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    let mut out = Vec::with_capacity(results.len());

    for result in results {
        if seen.insert(result.dedupe_key().to_string()) {
            out.push(result);
        } else {
            tracing::debug!(url = %result.url, "Dropping duplicate result");
        }
    }

    out
}

/// Concatenate per-provider lists in the given (priority) order, then dedupe.
pub fn merge<I>(lists: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Vec<SearchResult>>,
{
    dedupe(lists.into_iter().flatten().collect())
}
