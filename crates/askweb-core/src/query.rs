//! Search query preparation: LLM rewrite with fallback, quote stripping and
//! percent-escaping for provider query strings.

use std::borrow::Cow;

use crate::error::AppError;
use crate::traits::QueryFormulator;

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Turn the user's prompt into the query sent to the providers.
///
/// Without a formulator, or when it fails or answers with nothing usable,
/// the raw prompt is returned unmodified.
pub async fn formulate_query<Q: QueryFormulator>(formulator: Option<&Q>, prompt: &str) -> String {
    let Some(formulator) = formulator else {
        return prompt.to_string();
    };

    match formulator.formulate(prompt).await {
        Ok(candidate) => {
            let query = strip_quotes(&candidate);
            if query.is_empty() {
                tracing::warn!("Query rewrite came back empty, using the prompt as-is");
                prompt.to_string()
            } else {
                tracing::info!(query = %query, "Rewrote prompt into search query");
                query.to_string()
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Query rewrite failed, using the prompt as-is");
            prompt.to_string()
        }
    }
}

/// Trim whitespace and any surrounding quote characters.
pub fn strip_quotes(text: &str) -> &str {
    text.trim().trim_matches(QUOTE_CHARS).trim()
}

/// Percent-escape a query for use inside a URL query string.
pub fn escape_query(query: &str) -> Cow<'_, str> {
    urlencoding::encode(query)
}

/// Exact inverse of [`escape_query`].
pub fn unescape_query(escaped: &str) -> Result<String, AppError> {
    urlencoding::decode(escaped)
        .map(Cow::into_owned)
        .map_err(|e| AppError::ConfigError(format!("query is not valid percent-encoded UTF-8: {e}")))
}

/// Build `k1=v1&k2=v2` with every value percent-escaped.
pub fn query_string(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={}", escape_query(v)))
        .collect::<Vec<_>>()
        .join("&")
}
