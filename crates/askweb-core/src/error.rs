use thiserror::Error;

/// Application-wide error types for ask-web.
#[derive(Error, Debug)]
pub enum AppError {
    /// A GET returned something other than 200 OK.
    #[error("HTTP {status} {reason} for {url}")]
    HttpStatus {
        url: String,
        status: u16,
        reason: String,
    },

    /// HTTP request failed for a reason other than the status code.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// A search provider call failed (transport, status or malformed body).
    #[error("{provider} search failed: {message}")]
    SearchError {
        provider: String,
        status_code: Option<u16>,
        message: String,
    },

    /// Search was attempted with an empty query string.
    #[error("search query cannot be empty")]
    EmptyQuery,

    /// No search provider is usable with the resolved credentials.
    #[error("no search providers are enabled")]
    NoSearchProviders,

    /// LLM API call failed.
    #[error("LLM error (HTTP {status_code}): {message}")]
    LlmError { message: String, status_code: u16 },

    /// The LLM backend answered but produced zero candidates.
    #[error("no summary generated")]
    NoSummary,

    /// The configured model name does not map to a backend.
    #[error("unsupported model: {model}. Supported models: {}", .supported.join(", "))]
    UnsupportedModel {
        model: String,
        supported: Vec<&'static str>,
    },

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTML-to-text cleaning failed.
    #[error("Cleaner error: {0}")]
    CleanerError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppError {
    /// The HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::HttpStatus { status, .. } => Some(*status),
            AppError::LlmError { status_code, .. } => Some(*status_code),
            AppError::SearchError { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// True for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// True for any 5xx response.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_some_and(|s| (500..600).contains(&s))
    }

    /// True when the backend answered without any candidate output.
    pub fn is_no_summary(&self) -> bool {
        matches!(self, AppError::NoSummary)
    }

    /// True when the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::HttpError(_)
        )
    }
}
