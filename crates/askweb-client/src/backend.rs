//! LLM backend selection and the summarize / formulate capabilities built on it.

use std::fmt;
use std::time::Duration;

use askweb_core::error::AppError;
use askweb_core::options::Options;
use askweb_core::prompt::{
    QUERY_MAX_TOKENS, QUERY_SYSTEM_PROMPT, QUERY_TEMPERATURE, query_prompt, summary_prompt,
    token_budget_instruction,
};
use askweb_core::traits::{QueryFormulator, Summarizer};
use serde::Deserialize;

use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;

/// One prompt exchange, independent of the backend's wire format.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Model names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    ChatGpt,
    Gemini,
}

impl BackendKind {
    pub const SUPPORTED: &'static [&'static str] = &["chatgpt", "gemini"];

    /// Map a configured model name to a backend. Unknown names fail closed.
    pub fn parse(model: &str) -> Result<Self, AppError> {
        match model.trim().to_ascii_lowercase().as_str() {
            "chatgpt" => Ok(BackendKind::ChatGpt),
            "gemini" => Ok(BackendKind::Gemini),
            _ => Err(AppError::UnsupportedModel {
                model: model.to_string(),
                supported: Self::SUPPORTED.to_vec(),
            }),
        }
    }

    /// Credential that enables this backend.
    pub fn key_name(self) -> &'static str {
        match self {
            BackendKind::ChatGpt => "OPENAI_API_KEY",
            BackendKind::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::ChatGpt => write!(f, "chatgpt"),
            BackendKind::Gemini => write!(f, "gemini"),
        }
    }
}

/// The closed set of LLM backends.
#[derive(Clone)]
pub enum LlmBackend {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
}

impl LlmBackend {
    /// Build the backend for `kind`. An empty key means the backend is
    /// unusable, which is a configuration error.
    pub fn new(kind: BackendKind, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        if api_key.trim().is_empty() {
            return Err(AppError::ConfigError(format!(
                "model '{kind}' needs {} to be set",
                kind.key_name()
            )));
        }
        Ok(match kind {
            BackendKind::ChatGpt => LlmBackend::OpenAi(OpenAiClient::with_timeout(api_key, timeout)?),
            BackendKind::Gemini => LlmBackend::Gemini(GeminiClient::with_timeout(api_key, timeout)?),
        })
    }

    pub async fn complete(&self, completion: &Completion<'_>) -> Result<String, AppError> {
        match self {
            LlmBackend::OpenAi(client) => client.complete(completion).await,
            LlmBackend::Gemini(client) => client.complete(completion).await,
        }
    }
}

/// Summarizer that grounds any backend in the cleaned page contents.
#[derive(Clone)]
pub struct LlmSummarizer {
    backend: LlmBackend,
    instruction: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmSummarizer {
    pub fn new(backend: LlmBackend, options: &Options) -> Self {
        Self {
            backend,
            instruction: options.summary_prompt.clone(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }
}

impl Summarizer for LlmSummarizer {
    async fn summarize(&self, contents: &[String], query: &str) -> Result<String, AppError> {
        let system = token_budget_instruction(self.max_tokens);
        let prompt = summary_prompt(&self.instruction, query, contents);
        tracing::debug!(
            pages = contents.len(),
            prompt_bytes = prompt.len(),
            "Requesting summary"
        );

        self.backend
            .complete(&Completion {
                system: &system,
                prompt: &prompt,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .await
    }
}

/// Rewrites a prompt into a search query with a small, low-temperature call.
#[derive(Clone)]
pub struct LlmQueryFormulator {
    backend: LlmBackend,
    instruction: String,
}

impl LlmQueryFormulator {
    pub fn new(backend: LlmBackend, options: &Options) -> Self {
        Self {
            backend,
            instruction: options.query_prompt.clone(),
        }
    }
}

impl QueryFormulator for LlmQueryFormulator {
    async fn formulate(&self, prompt: &str) -> Result<String, AppError> {
        let user = query_prompt(&self.instruction, prompt);
        self.backend
            .complete(&Completion {
                system: QUERY_SYSTEM_PROMPT,
                prompt: &user,
                max_tokens: QUERY_MAX_TOKENS,
                temperature: QUERY_TEMPERATURE,
            })
            .await
    }
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Map a non-2xx LLM response to [`AppError::LlmError`], preferring the
/// API's own `error.message` over the raw body.
pub(crate) fn api_error(status_code: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status_code}: {}", crate::http::body_snippet(body)));
    AppError::LlmError {
        message,
        status_code,
    }
}

/// A 2xx answer whose body is not the documented shape.
pub(crate) fn malformed_response(status_code: u16, e: reqwest::Error) -> AppError {
    AppError::LlmError {
        message: format!("Failed to parse LLM response: {e}"),
        status_code,
    }
}
