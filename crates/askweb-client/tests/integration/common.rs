use std::time::Duration;

use askweb_client::{DuckDuckGoSearch, LlmBackend, OpenAiClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A DuckDuckGo results page whose links point back at `base`.
pub fn results_page(base: &str) -> String {
    format!(
        r#"<html><body>
<div class="result results_links results_links_deep web-result">
  <a class="result__a" href="{base}/page1">Rust</a>
  <div class="result__snippet">Fast and safe.</div>
</div>
<div class="result results_links results_links_deep web-result">
  <a class="result__a" href="{base}/page2?utm_source=ddg">Broken page</a>
</div>
<div class="result results_links results_links_deep web-result">
  <a class="result__a" href="https://en.wikipedia.org/wiki/Rust_(programming_language)">Wikipedia</a>
</div>
<div class="result results_links results_links_deep web-result">
  <a class="result__a" href="{base}/guide">Guide</a>
</div>
<div class="result results_links results_links_deep web-result">
  <a class="result__a" href="{base}/page1?ref=dup">Rust again</a>
</div>
</body></html>"#
    )
}

/// Mounts the search page and three target pages, one of them missing.
pub async fn mount_web(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(results_page(&server.uri())),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><h1>Rust</h1><p>Fast and safe.</p></body></html>",
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<p>Ownership <b>rules</b>.</p><script>track()</script>",
        ))
        .mount(server)
        .await;
}

pub fn duckduckgo(server: &MockServer) -> DuckDuckGoSearch {
    DuckDuckGoSearch::new(Duration::from_secs(5))
        .unwrap()
        .with_endpoint(&format!("{}/html/", server.uri()))
}

pub fn openai(server: &MockServer) -> LlmBackend {
    LlmBackend::OpenAi(
        OpenAiClient::new("sk-test")
            .unwrap()
            .with_base_url(&server.uri()),
    )
}
