//! End-to-end tests against a mock Elasticsearch HTTP server.

use std::sync::Arc;
use std::time::Duration;

use quarry::{QuarryConfig, SearchEngine, SearchOptions};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{hit, hits_response};

fn engine_for(server: &MockServer) -> SearchEngine {
    let mut config = QuarryConfig::default();
    config.backend.hosts = server.uri();
    SearchEngine::connect(Arc::new(config)).unwrap()
}

/// Poll the server until `count` requests matching `pred` arrived.
async fn wait_for_requests<F>(server: &MockServer, count: usize, pred: F) -> bool
where
    F: Fn(&wiremock::Request) -> bool,
{
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.iter().filter(|r| pred(r)).count() >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_structured_search_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wiki/_search"))
        .and(body_partial_json(json!({
            "query": {"bool": {"filter": [{"terms": {"tags.kw": ["howto"]}}]}},
            "indices_boost": [{"wiki": 2.0}],
            "from": 0,
            "size": 50
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hits_response(vec![hit("1", 4.2, "Setup guide", &["howto"])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wiki-search-stats/_doc"))
        .and(query_param("refresh", "true"))
        .and(body_partial_json(json!({
            "terms": "setup guide",
            "user": {"email": "alice@example.com"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"result": "created"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = engine_for(&server)
        .search(
            r#"#PWTJSON#:{"q":"setup guide","tags":["howto"]}"#,
            &SearchOptions::for_user("alice@example.com"),
        )
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert!(response.results[0].score > 0.0);
    assert!(wait_for_requests(&server, 1, |r| r.url.path() == "/wiki-search-stats/_doc").await);
}

#[tokio::test]
async fn test_provisioning_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/wiki"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/wiki-search-stats"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/wiki-search-stats"))
        .and(body_partial_json(json!({
            "mappings": {"properties": {"ts": {"type": "date"}}},
            "settings": {"analysis": {"analyzer": {"default": {"type": "simple"}}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/wiki"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = engine_for(&server).provision().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.created(), 1);
}

#[tokio::test]
async fn test_backend_error_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wiki/_search"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"type": "index_not_found_exception"}})),
        )
        .mount(&server)
        .await;

    let err = engine_for(&server)
        .search(r#"#PWTJSON#:{"q":"x"}"#, &SearchOptions::default())
        .await
        .unwrap_err();

    match err {
        quarry::Error::Backend { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("index_not_found_exception"));
        }
        other => unreachable!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_stats_rejection_over_http_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wiki/_search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(hits_response(vec![hit("1", 1.0, "A", &[])])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wiki-search-stats/_doc"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let response = engine_for(&server)
        .search("a", &SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert!(wait_for_requests(&server, 1, |r| r.url.path() == "/wiki-search-stats/_doc").await);
}

#[tokio::test]
async fn test_index_name_stays_inside_its_path_segment() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wiki%2F_delete_by_query%3Fconflicts=proceed/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hits_response(vec![])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wiki-search-stats/_doc"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    engine_for(&server)
        .search(
            r#"#PWTJSON#:{"index":{"wiki/_delete_by_query?conflicts=proceed":{}}}"#,
            &SearchOptions::default(),
        )
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| !r.url.path().contains("_delete_by_query/")));
    assert!(received.iter().all(|r| r.url.query_pairs().all(|(k, _)| k != "conflicts")));
}
