use std::time::Duration;

use askweb_core::error::AppError;
use askweb_core::options::DEFAULT_LLM_TIMEOUT_SECS;
use askweb_core::prompt::combined_prompt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{Completion, api_error, malformed_response};
use crate::http::{CLIENT_USER_AGENT, build_client, send_error};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash-001";

/// Generative-content backend (Gemini API).
///
/// The API has no system role for this call shape, so the system text is
/// prepended to the prompt.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS))
    }

    pub fn with_timeout(api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout, CLIENT_USER_AGENT)?,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: GEMINI_MODEL.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The text parts of the first candidate, concatenated. Zero
    /// candidates, or a first candidate without text (a safety stop), is
    /// [`AppError::NoSummary`].
    pub async fn complete(&self, completion: &Completion<'_>) -> Result<String, AppError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let text = combined_prompt(completion.system, completion.prompt);

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: &text }],
            }],
            generation_config: GenerationConfig {
                temperature: completion.temperature,
                max_output_tokens: completion.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| malformed_response(status.as_u16(), e))?;

        let candidate = generated
            .candidates
            .into_iter()
            .next()
            .ok_or(AppError::NoSummary)?;

        candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .ok_or(AppError::NoSummary)
    }
}

// ---- Generative content API types ----

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
