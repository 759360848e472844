use serde::Serialize;

use crate::error::AppError;
use crate::filter::UrlFilter;

pub const DEFAULT_MODEL: &str = "chatgpt";
pub const DEFAULT_MAX_TOKENS: u32 = 420;
pub const DEFAULT_NUM_RESULTS: usize = 3;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_QUERY_PROMPT: &str =
    "Turn this prompt into a search query, ensuring to retain its meaning";
pub const DEFAULT_SUMMARY_PROMPT: &str =
    "Please provide a detailed summary of the following text that is directly related to the query";
pub const DEFAULT_FILTER: &[&str] = &["wikipedia.org", "britannica.com"];
pub const DEFAULT_SCREEN_WIDTH: usize = 80;
pub const DEFAULT_TAB_WIDTH: usize = 4;
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Output never grows wider than this, whatever the terminal reports.
const MAX_WRAP_COLUMNS: usize = 80;
const WRAP_MARGIN: usize = 5;

/// Resolved, immutable run configuration.
///
/// Built once at startup and handed to components by shared reference.
#[derive(Debug, Clone, Serialize)]
pub struct Options {
    pub model: String,
    pub num_results: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub query_prompt: String,
    pub summary_prompt: String,
    pub filter: Vec<String>,
    pub screen_width: usize,
    pub tab_width: usize,
    pub max_concurrent_downloads: usize,
    pub http_timeout_secs: u64,
    pub llm_timeout_secs: u64,
    /// Skip the LLM query rewrite and search with the prompt as typed.
    pub rewrite_query: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            num_results: DEFAULT_NUM_RESULTS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            query_prompt: DEFAULT_QUERY_PROMPT.to_string(),
            summary_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
            filter: DEFAULT_FILTER.iter().map(|s| s.to_string()).collect(),
            screen_width: DEFAULT_SCREEN_WIDTH,
            tab_width: DEFAULT_TAB_WIDTH,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            rewrite_query: true,
        }
    }
}

impl Options {
    /// Reject values no run could succeed with.
    ///
    /// Model names are checked by the backend factory, which owns the list.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.model.trim().is_empty() {
            return Err(AppError::ConfigError("model name cannot be empty".into()));
        }
        if self.num_results == 0 {
            return Err(AppError::ConfigError(
                "num_results must be at least 1".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(AppError::ConfigError("max_tokens must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::ConfigError(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        if self.max_concurrent_downloads == 0 {
            return Err(AppError::ConfigError(
                "max_concurrent_downloads must be at least 1".into(),
            ));
        }
        if self.http_timeout_secs == 0 || self.llm_timeout_secs == 0 {
            return Err(AppError::ConfigError("timeouts must be at least 1 second".into()));
        }
        Ok(())
    }

    /// Column at which summaries are wrapped for display.
    pub fn wrap_width(&self) -> usize {
        self.screen_width
            .min(MAX_WRAP_COLUMNS)
            .saturating_sub(WRAP_MARGIN)
            .max(1)
    }

    /// The configured URL filter, or `None` when the list is empty.
    pub fn url_filter(&self) -> Option<UrlFilter> {
        let filter = UrlFilter::new(self.filter.iter().cloned());
        (!filter.is_empty()).then_some(filter)
    }
}
