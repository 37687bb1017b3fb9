//! Integration tests for the statistics side channel.

use quarry::{QuarryConfig, SearchOptions};
use serde_json::json;

use crate::common::{TestHarness, hit, hits_response};

const QUERY: &str = r#"#PWTJSON#:{"q":"setup guide","tags":["howto"]}"#;

#[tokio::test]
async fn test_stats_failure_does_not_change_response() {
    let healthy = TestHarness::new();
    healthy
        .client
        .push_search_response(hits_response(vec![hit("1", 4.2, "Setup guide", &["howto"])]));
    let expected = healthy
        .engine()
        .search(QUERY, &SearchOptions::for_user("alice@example.com"))
        .await
        .unwrap();

    let broken = TestHarness::new();
    broken.client.fail_writes("wiki-search-stats");
    broken
        .client
        .push_search_response(hits_response(vec![hit("1", 4.2, "Setup guide", &["howto"])]));
    let actual = broken
        .engine()
        .search(QUERY, &SearchOptions::for_user("alice@example.com"))
        .await
        .unwrap();

    assert_eq!(actual, expected);

    // The write was attempted and rejected without surfacing.
    assert!(broken.wait_for_stats(1).await);
    assert_eq!(broken.stat_documents().len(), 1);
}

#[tokio::test]
async fn test_stats_failure_on_free_text_path() {
    let harness = TestHarness::new();
    harness.client.fail_writes("wiki-search-stats");

    let response = harness
        .engine()
        .search("setup guide", &SearchOptions::default())
        .await;

    assert!(response.is_ok());
    assert!(harness.wait_for_stats(1).await);
}

#[tokio::test]
async fn test_one_record_per_search() {
    let harness = TestHarness::new();
    let engine = harness.engine();

    engine.search(QUERY, &SearchOptions::default()).await.unwrap();
    engine.search("plain text", &SearchOptions::default()).await.unwrap();
    engine.search("#PWTJSON#:{}", &SearchOptions::default()).await.unwrap();

    assert!(harness.wait_for_stats(3).await);
    assert_eq!(harness.stat_documents().len(), 3);
}

#[tokio::test]
async fn test_stats_go_to_configured_index() {
    let mut config = QuarryConfig::default();
    config.index.stats_index_name = "audit".to_string();
    let harness = TestHarness::with_config(config);

    harness
        .engine()
        .search("plain", &SearchOptions::default())
        .await
        .unwrap();

    assert!(harness.wait_for_stats(1).await);
    assert_eq!(harness.client.documents("audit").len(), 1);
    assert!(harness.client.documents("wiki-search-stats").is_empty());
}

#[tokio::test]
async fn test_disabled_stats_write_nothing() {
    let mut config = QuarryConfig::default();
    config.stats.enabled = false;
    let harness = TestHarness::with_config(config);

    harness
        .engine()
        .search(QUERY, &SearchOptions::default())
        .await
        .unwrap();
    tokio::task::yield_now().await;

    assert!(harness.stat_documents().is_empty());
}

#[tokio::test]
async fn test_stat_record_embeds_response() {
    let harness = TestHarness::new();
    harness.client.push_search_response(hits_response(vec![
        hit("1", 2.0, "One", &["a"]),
        hit("2", 1.0, "Two", &["b"]),
    ]));

    harness
        .engine()
        .search(r#"#PWTJSON#:{"q":"o"}"#, &SearchOptions::for_user("x@example.com"))
        .await
        .unwrap();

    assert!(harness.wait_for_stats(1).await);
    let doc = &harness.stat_documents()[0];
    assert_eq!(doc["results"]["totalHits"], 2);
    assert_eq!(doc["results"]["results"][1]["tags"], json!(["b"]));
    assert!(doc["ts"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_empty_free_text_records_empty_terms() {
    let harness = TestHarness::new();

    harness
        .engine()
        .search("", &SearchOptions::default())
        .await
        .unwrap();

    assert!(harness.wait_for_stats(1).await);
    let doc = &harness.stat_documents()[0];
    assert_eq!(doc["terms"], "");
    assert!(doc["extra"]["rawSearch"].is_null());
}

#[tokio::test]
async fn test_empty_structured_text_records_empty_terms() {
    let harness = TestHarness::new();

    harness
        .engine()
        .search(r#"#PWTJSON#:{"q":""}"#, &SearchOptions::default())
        .await
        .unwrap();

    assert!(harness.wait_for_stats(1).await);
    assert_eq!(harness.stat_documents()[0]["terms"], "");
}

#[tokio::test]
async fn test_raw_search_matches_request_payload() {
    let harness = TestHarness::new();

    harness
        .engine()
        .search(
            r#"#PWTJSON#:{"index":{"zeta":{"boost":1},"alpha":{"boost":3}},"q":"guide"}"#,
            &SearchOptions::default(),
        )
        .await
        .unwrap();

    assert!(harness.wait_for_stats(1).await);
    let raw = &harness.stat_documents()[0]["extra"]["rawSearch"];
    assert_eq!(
        raw,
        &json!({"index": {"zeta": {"boost": 1}, "alpha": {"boost": 3}}, "q": "guide"})
    );
    let order: Vec<_> = raw.as_object().unwrap().keys().cloned().collect();
    assert_eq!(order, vec!["index", "q"]);
    let indices: Vec<_> = raw["index"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(indices, vec!["zeta", "alpha"]);
    assert!(raw.get("tags").is_none());
    assert!(raw.get("paths").is_none());
}
