//! Integration tests for structured and free-text search routing.

use std::sync::Arc;

use quarry::{Error, QuarryConfig, SearchEngine, SearchOptions, SearchResponse};
use quarry_elastic::{Call, MockSearchClient};
use serde_json::json;

use crate::common::{MockFallback, TestHarness, hit, hits_response, result};

#[tokio::test]
async fn test_structured_query_end_to_end() {
    let harness = TestHarness::new();
    harness
        .client
        .push_search_response(hits_response(vec![hit("1", 4.2, "Setup guide", &["howto"])]));
    let engine = harness.engine();

    let response = engine
        .search(
            r#"#PWTJSON#:{"q":"setup guide","tags":["howto"]}"#,
            &SearchOptions::for_user("alice@example.com"),
        )
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert!(response.results[0].score > 0.0);
    assert_eq!(response.results[0].title.as_deref(), Some("Setup guide"));
    assert_eq!(response.total_hits, 1);

    assert!(harness.wait_for_stats(1).await);
    let stats = harness.stat_documents();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0]["terms"], "setup guide");
    assert_eq!(stats[0]["user"]["email"], "alice@example.com");
    assert_eq!(stats[0]["extra"]["rawSearch"]["tags"], json!(["howto"]));
    assert_eq!(stats[0]["results"]["results"][0]["id"], "1");

    assert!(harness.fallback.calls().is_empty());
}

#[tokio::test]
async fn test_structured_query_body_sent_to_backend() {
    let harness = TestHarness::new();
    harness
        .engine()
        .search(
            r#"#PWTJSON#:{"q":"setup guide","tags":["howto"]}"#,
            &SearchOptions::default(),
        )
        .await
        .unwrap();

    let searches = harness.client.searches();
    assert_eq!(searches.len(), 1);
    let (indices, body) = &searches[0];
    assert_eq!(indices, &vec!["wiki".to_string()]);
    assert_eq!(
        body["query"]["bool"]["filter"],
        json!([{"terms": {"tags.kw": ["howto"]}}])
    );
    assert_eq!(
        body["query"]["bool"]["must"][0]["simple_query_string"]["query"],
        "*setup guide*"
    );
    assert_eq!(body["indices_boost"], json!([{"wiki": 2.0}]));
    assert_eq!(body["size"], 50);
}

#[tokio::test]
async fn test_free_text_routed_to_fallback() {
    let fallback_response = SearchResponse {
        results: vec![result("9", "Setup guide")],
        suggestions: vec!["setup".to_string()],
        total_hits: 1,
    };
    let harness = TestHarness::with_fallback_response(fallback_response.clone());
    let engine = harness.engine();
    let options = SearchOptions::for_user("bob@example.com");

    let response = engine.search("setup guide", &options).await.unwrap();

    // Passed through unchanged.
    assert_eq!(response, fallback_response);
    assert_eq!(
        harness.fallback.calls(),
        vec![("setup guide".to_string(), options)]
    );
    assert!(harness.client.searches().is_empty());

    assert!(harness.wait_for_stats(1).await);
    let stats = harness.stat_documents();
    assert_eq!(stats[0]["terms"], "setup guide");
    assert!(stats[0]["extra"]["rawSearch"].is_null());
}

#[tokio::test]
async fn test_filter_only_query_records_no_terms() {
    let harness = TestHarness::new();
    harness
        .client
        .push_search_response(hits_response(vec![hit("1", 1.0, "A", &["howto"])]));

    harness
        .engine()
        .search(r#"#PWTJSON#:{"tags":["howto"]}"#, &SearchOptions::default())
        .await
        .unwrap();

    assert!(harness.wait_for_stats(1).await);
    assert!(harness.stat_documents()[0].get("terms").is_none());
}

#[tokio::test]
async fn test_results_keep_backend_order() {
    let harness = TestHarness::new();
    harness.client.push_search_response(hits_response(vec![
        hit("low", 0.5, "Low", &[]),
        hit("high", 9.0, "High", &[]),
        hit("mid", 3.0, "Mid", &[]),
    ]));

    let response = harness
        .engine()
        .search(r#"#PWTJSON#:{"q":"x"}"#, &SearchOptions::default())
        .await
        .unwrap();

    let ids: Vec<_> = response.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["low", "high", "mid"]);
}

#[tokio::test]
async fn test_backend_failure_propagates() {
    let harness = TestHarness::new();
    harness.client.fail_search();

    let err = harness
        .engine()
        .search(r#"#PWTJSON#:{"q":"x"}"#, &SearchOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_backend());
    assert!(harness.stat_documents().is_empty());
}

#[tokio::test]
async fn test_fallback_failure_propagates() {
    let client = Arc::new(MockSearchClient::new());
    let engine = SearchEngine::new(
        client.clone(),
        Arc::new(MockFallback::failing()),
        Arc::new(QuarryConfig::default()),
    );

    let err = engine
        .search("setup guide", &SearchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unavailable { .. }));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_descriptor_is_translation_error() {
    let harness = TestHarness::new();

    let err = harness
        .engine()
        .search(r#"#PWTJSON#:{"q": "#, &SearchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Translation { .. }));
    assert!(harness.client.calls().is_empty());
    assert!(harness.fallback.calls().is_empty());
}

#[tokio::test]
async fn test_empty_result_is_not_an_error() {
    let harness = TestHarness::new();

    let response = harness
        .engine()
        .search(r#"#PWTJSON#:{"q":"nothing"}"#, &SearchOptions::default())
        .await
        .unwrap();

    assert!(response.results.is_empty());
    assert_eq!(response.total_hits, 0);
}

#[tokio::test]
async fn test_custom_content_index_is_default_target() {
    let mut config = QuarryConfig::default();
    config.index.index_name = "kb".to_string();
    let harness = TestHarness::with_config(config);

    harness
        .engine()
        .search("#PWTJSON#:{}", &SearchOptions::default())
        .await
        .unwrap();

    let (indices, body) = &harness.client.searches()[0];
    assert_eq!(indices, &vec!["kb".to_string()]);
    assert_eq!(body["indices_boost"], json!([{"kb": 2.0}]));
}

#[tokio::test]
async fn test_search_calls_are_sequential_per_request() {
    let harness = TestHarness::new();
    harness.engine().search("#PWTJSON#:{}", &SearchOptions::default()).await.unwrap();
    assert!(harness.wait_for_stats(1).await);

    let calls = harness.client.calls();
    assert!(matches!(calls[0], Call::Search { .. }));
    assert!(matches!(calls[1], Call::IndexDocument { .. }));
}
