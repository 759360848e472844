use std::time::Duration;

use askweb_client::{LlmQueryFormulator, LlmSummarizer, Provider, ReqwestFetcher, StrictCleaner};
use askweb_core::options::Options;
use askweb_core::pipeline::{ResearchService, TracingReporter};
use askweb_core::query::formulate_query;
use askweb_core::testutil::MockStore;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::integration::common::{duckduckgo, mount_web, openai};

fn options() -> Options {
    Options {
        num_results: 3,
        summary_prompt: "Summarize".into(),
        ..Options::default()
    }
}

#[tokio::test]
async fn full_run_against_mock_web() {
    let server = MockServer::start().await;
    mount_web(&server).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "Fit the response within 420 tokens"},
                {"role": "user", "content": "Summarize 'rust language'. \nRust Fast and safe.\nOwnership rules.\nSummary:"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Rust is fast, safe and ownership-based."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = options();
    let store = MockStore::empty();
    let service = ResearchService::with_store(
        vec![Provider::DuckDuckGo(duckduckgo(&server))],
        ReqwestFetcher::with_timeout(Duration::from_secs(5)).unwrap(),
        StrictCleaner::default(),
        LlmSummarizer::new(openai(&server), &options),
        store.clone(),
        &options,
    );

    let outcome = service.run("rust language", &TracingReporter).await.unwrap();

    let base = server.uri();
    let urls: Vec<_> = outcome.results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{base}/page1"),
            format!("{base}/page2?utm_source=ddg"),
            format!("{base}/guide"),
        ]
    );
    assert_eq!(outcome.pages_used, 2);
    assert_eq!(outcome.summary, "Rust is fast, safe and ownership-based.");
    assert_eq!(outcome.conversation_id, Some(1));

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].query, "rust language");
    assert_eq!(saved[0].result_urls, urls);
}

#[tokio::test]
async fn summarizer_failure_saves_nothing() {
    let server = MockServer::start().await;
    mount_web(&server).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let options = options();
    let store = MockStore::empty();
    let service = ResearchService::with_store(
        vec![Provider::DuckDuckGo(duckduckgo(&server))],
        ReqwestFetcher::with_timeout(Duration::from_secs(5)).unwrap(),
        StrictCleaner::default(),
        LlmSummarizer::new(openai(&server), &options),
        store.clone(),
        &options,
    );

    let err = service.run("rust language", &TracingReporter).await.unwrap_err();
    assert!(err.is_no_summary());
    assert!(store.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn formulated_query_drives_the_search() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 50})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "'rust ownership'"}}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(wiremock::matchers::query_param("q", "rust ownership"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let options = options();
    let formulator = LlmQueryFormulator::new(openai(&server), &options);
    let query = formulate_query(Some(&formulator), "how does ownership work in rust?").await;
    assert_eq!(query, "rust ownership");

    let service = ResearchService::with_store(
        vec![Provider::DuckDuckGo(duckduckgo(&server))],
        ReqwestFetcher::new().unwrap(),
        StrictCleaner::default(),
        LlmSummarizer::new(openai(&server), &options),
        MockStore::empty(),
        &options,
    );
    let results = service.search(&query, &TracingReporter).await.unwrap();
    assert!(results.is_empty());
}
