pub mod backend;
pub mod cleaner;
pub mod fetcher;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod search;

pub use backend::{BackendKind, Completion, LlmBackend, LlmQueryFormulator, LlmSummarizer};
pub use cleaner::StrictCleaner;
pub use fetcher::ReqwestFetcher;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use search::{BingSearch, DuckDuckGoSearch, GoogleSearch, Provider};
