//! Integration tests for the Wikipedia adapter against a mock HTTP server.

use api_lib::adapters::{WikipediaAdapter, WikipediaSettings};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use study_helper_core::lookup::LookupClient;
use study_helper_core::ports::{EncyclopediaService, FetchError};
use study_helper_core::retry::RetryPolicy;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer) -> WikipediaAdapter {
    WikipediaAdapter::new(WikipediaSettings {
        rest_base: format!("{}/api/rest_v1", server.uri()),
        action_api: format!("{}/w/api.php", server.uri()),
        user_agent: "StudyHelperTest/1.0".to_string(),
        lookup_timeout: Duration::from_millis(200),
        search_timeout: Duration::from_millis(200),
    })
    .expect("client builds")
}

fn summary_body(title: &str, extract: &str) -> serde_json::Value {
    json!({
        "title": title,
        "extract": extract,
        "content_urls": { "desktop": { "page": format!("https://en.wikipedia.org/wiki/{}", title) } }
    })
}

#[tokio::test]
async fn page_summary_maps_fields_and_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Ancient_Rome"))
        .and(header("user-agent", "StudyHelperTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Ancient Rome",
            "extract": "Ancient Rome was a civilization.",
            "content_urls": { "desktop": { "page": "https://en.wikipedia.org/wiki/Ancient_Rome" } },
            "thumbnail": { "source": "https://upload.wikimedia.org/rome.jpg" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = adapter(&server).page_summary("Ancient_Rome").await.unwrap();

    assert_eq!(summary.title.as_deref(), Some("Ancient Rome"));
    assert_eq!(summary.extract.as_deref(), Some("Ancient Rome was a civilization."));
    assert_eq!(summary.page_url.as_deref(), Some("https://en.wikipedia.org/wiki/Ancient_Rome"));
    assert_eq!(summary.thumbnail.as_deref(), Some("https://upload.wikimedia.org/rome.jpg"));
}

#[tokio::test]
async fn missing_page_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Zzqxnotatopic123"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = adapter(&server).page_summary("Zzqxnotatopic123").await;

    assert_eq!(result, Err(FetchError::NotFound));
}

#[tokio::test]
async fn server_errors_keep_their_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Rust"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = adapter(&server).page_summary("Rust").await;

    assert_eq!(result, Err(FetchError::Status(503)));
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Rust"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(summary_body("Rust", "Rust."))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = adapter(&server).page_summary("Rust").await;

    assert_eq!(result, Err(FetchError::Timeout));
}

#[tokio::test]
async fn search_returns_ranked_titles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "query"))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", "Mercury"))
        .and(query_param("srlimit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "search": [ { "title": "Mercury (planet)" } ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let titles = adapter(&server).search_titles("Mercury", 1).await.unwrap();

    assert_eq!(titles, vec!["Mercury (planet)"]);
}

#[tokio::test]
async fn opensearch_returns_suggestion_titles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "opensearch"))
        .and(query_param("search", "Photosynthesis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "Photosynthesis",
            ["Photosynthesis", "Photosystem", "Photosynthetic efficiency"],
            ["", "", ""],
            ["", "", ""]
        ])))
        .mount(&server)
        .await;

    let titles = adapter(&server).suggest_titles("Photosynthesis", 8).await.unwrap();

    assert_eq!(titles, vec!["Photosynthesis", "Photosystem", "Photosynthetic efficiency"]);
}

#[tokio::test]
async fn lookup_follows_disambiguation_through_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Mercury"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(summary_body("Mercury", "Mercury may refer to:")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("srsearch", "Mercury"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "search": [ { "title": "Mercury (planet)" } ] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Mercury_(planet)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary_body(
            "Mercury (planet)",
            "Mercury is the first planet from the Sun and the smallest in the Solar System. \
             It is a rocky planet with a trace atmosphere.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = LookupClient::new(Arc::new(adapter(&server)));
    let result = client.lookup("Mercury").await;

    assert!(result.success);
    assert_eq!(result.title, "Mercury (planet)");
    assert!(result.content.starts_with("Mercury is the first planet"));
}

#[tokio::test]
async fn lookup_retries_server_errors_up_to_the_attempt_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Rust"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = LookupClient::new(Arc::new(adapter(&server)))
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)));
    let result = client.lookup("Rust").await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("HTTP 500"));
}
