use std::time::Duration;

use askweb_core::error::AppError;
use askweb_core::options::DEFAULT_LLM_TIMEOUT_SECS;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{Completion, api_error, malformed_response};
use crate::http::{CLIENT_USER_AGENT, build_client, send_error};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Chat-completion backend (OpenAI and compatible APIs).
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS))
    }

    pub fn with_timeout(api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout, CLIENT_USER_AGENT)?,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: OPENAI_MODEL.to_string(),
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

    /// One system + user exchange. Zero choices, or a first choice with no
    /// text, is [`AppError::NoSummary`].
    pub async fn complete(&self, completion: &Completion<'_>) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: completion.system,
                },
                Message {
                    role: "user",
                    content: completion.prompt,
                },
            ],
            max_tokens: completion.max_tokens,
            temperature: completion.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| malformed_response(status.as_u16(), e))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AppError::NoSummary)
    }
}

// ---- Chat completion API types ----

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion<'a>() -> Completion<'a> {
        Completion {
            system: "Fit the response within 420 tokens",
            prompt: "Summarize 'rust'. \npage\nSummary:",
            max_tokens: 420,
            temperature: 0.7,
        }
    }

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new("sk-test").unwrap().with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_single_choice_is_returned_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 420,
                "messages": [
                    {"role": "system", "content": "Fit the response within 420 tokens"},
                    {"role": "user", "content": "Summarize 'rust'. \npage\nSummary:"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Rust is a language."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).complete(&completion()).await.unwrap();
        assert_eq!(text, "Rust is a language.");
    }

    #[tokio::test]
    async fn test_zero_choices_is_no_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client(&server).complete(&completion()).await.unwrap_err();
        assert!(err.is_no_summary());
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_empty_content_is_no_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": ""}, "finish_reason": "content_filter"}
                ]
            })))
            .mount(&server)
            .await;

        let err = client(&server).complete(&completion()).await.unwrap_err();
        assert!(err.is_no_summary());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client(&server).complete(&completion()).await.unwrap_err();
        assert!(!err.is_transport());
        assert!(!err.is_no_summary());
        assert!(matches!(err, AppError::LlmError { status_code: 200, .. }));
        assert!(err.to_string().contains("Failed to parse LLM response"));
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).complete(&completion()).await.unwrap_err();
        match err {
            AppError::LlmError {
                message,
                status_code,
            } => {
                assert_eq!(status_code, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete(&completion()).await.unwrap_err();
        assert!(err.is_server_error());
    }
}
