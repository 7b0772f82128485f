//! HTTP search client against a mocked cluster.

use futures::TryStreamExt;
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brownfield::core::converter::{index_to_document_store, ConversionOptions};
use brownfield::core::models::{Document, ORIGINAL_ID_KEY};
use brownfield::core::source::{
    ConnectionConfig, Credentials, SearchBackend, SearchClient, SearchQuery, SourceError,
    SourceIndex,
};
use brownfield::core::store::{DocumentStore, InMemoryDocumentStore};

// ============================================================================
// Helpers
// ============================================================================

fn config_for(backend: SearchBackend, hosts: Vec<String>) -> ConnectionConfig {
    let mut config = ConnectionConfig::for_backend(backend);
    config.hosts = hosts;
    config.credentials = Credentials::default();
    config
}

fn client_for(server: &MockServer) -> SearchClient {
    let config = config_for(SearchBackend::Elasticsearch, vec![server.uri()]);
    SearchClient::connect(SearchBackend::Elasticsearch, &config).unwrap()
}

fn hit(id: &str, body: &str) -> serde_json::Value {
    json!({"_index": "articles", "_id": id, "_score": null, "_source": {"body": body}})
}

fn scroll_page(scroll_id: &str, hits: Vec<serde_json::Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "_scroll_id": scroll_id,
        "hits": {"total": {"value": 3}, "hits": hits}
    }))
}

/// Mount a three-record index served over two scroll pages.
async fn mount_three_record_scroll(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/articles/_search"))
        .and(query_param("scroll", "5m"))
        .and(body_partial_json(json!({"sort": ["_doc"]})))
        .respond_with(scroll_page("s1", vec![hit("a", "first"), hit("b", "second")]))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .and(body_partial_json(json!({"scroll_id": "s1"})))
        .respond_with(scroll_page("s1", vec![hit("c", "third")]))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .respond_with(scroll_page("s1", vec![]))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/_search/scroll"))
        .and(body_partial_json(json!({"scroll_id": ["s1"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"succeeded": true})))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Count and scan
// ============================================================================

#[tokio::test]
async fn test_count_posts_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles/_count"))
        .and(body_partial_json(json!({"query": {"bool": {"must": [{"match_all": {}}]}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let total = client
        .count("articles", &SearchQuery::match_all())
        .await
        .unwrap();
    assert_eq!(total, 42);
}

#[tokio::test]
async fn test_count_sends_exclusion_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles/_count"))
        .and(body_partial_json(json!({
            "query": {"bool": {"filter": {"bool": {"must_not": [{"terms": {"_id": ["a", "b"]}}]}}}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let total = client
        .count("articles", &SearchQuery::excluding_ids(["a", "b"]))
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[tokio::test]
async fn test_scan_follows_scroll_and_clears_it() {
    let server = MockServer::start().await;
    mount_three_record_scroll(&server).await;

    let client = client_for(&server);
    let query = SearchQuery::match_all();
    let records: Vec<_> = client.scan("articles", &query).try_collect().await.unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(records[2].source["body"], json!("third"));
}

#[tokio::test]
async fn test_scan_uses_configured_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles/_search"))
        .and(body_partial_json(json!({"size": 2})))
        .respond_with(scroll_page("s9", vec![]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/_search/scroll"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut config = config_for(SearchBackend::Elasticsearch, vec![server.uri()]);
    config.scroll_page_size = 2;
    let client = SearchClient::connect(SearchBackend::Elasticsearch, &config).unwrap();
    let query = SearchQuery::match_all();
    let records: Vec<_> = client.scan("articles", &query).try_collect().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_missing_index_is_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/absent/_count"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"type": "index_not_found_exception"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .count("absent", &SearchQuery::match_all())
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Request { status: 404, .. }));
}

// ============================================================================
// Authentication
// ============================================================================

#[rstest]
#[case::basic(
    Credentials { username: "elastic".into(), password: "changeme".into(), ..Credentials::default() },
    "Basic ZWxhc3RpYzpjaGFuZ2VtZQ=="
)]
#[case::api_key(
    Credentials { api_key_id: Some("key-id".into()), api_key: Some("key-secret".into()), ..Credentials::default() },
    "ApiKey a2V5LWlkOmtleS1zZWNyZXQ="
)]
#[case::bearer(
    Credentials { bearer_token: Some("tok123".into()), ..Credentials::default() },
    "Bearer tok123"
)]
#[tokio::test]
async fn test_authorization_header(#[case] credentials: Credentials, #[case] expected: &str) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles/_count"))
        .and(header("authorization", expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(SearchBackend::Elasticsearch, vec![server.uri()]);
    config.credentials = credentials;
    let client = SearchClient::connect(SearchBackend::Elasticsearch, &config).unwrap();
    assert_eq!(
        client.count("articles", &SearchQuery::match_all()).await.unwrap(),
        7
    );
}

#[tokio::test]
async fn test_rejected_credentials_are_not_retried_on_other_nodes() {
    let denying = MockServer::start().await;
    let healthy = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&denying)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1})))
        .expect(0)
        .mount(&healthy)
        .await;

    let config = config_for(
        SearchBackend::Elasticsearch,
        vec![denying.uri(), healthy.uri()],
    );
    let client = SearchClient::connect(SearchBackend::Elasticsearch, &config).unwrap();
    let err = client
        .count("articles", &SearchQuery::match_all())
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Authentication(_)));
}

// ============================================================================
// Nodes
// ============================================================================

#[tokio::test]
async fn test_fails_over_to_next_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles/_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 3})))
        .expect(1)
        .mount(&server)
        .await;

    // Port 1 refuses connections.
    let config = config_for(
        SearchBackend::Elasticsearch,
        vec!["http://127.0.0.1:1".to_string(), server.uri()],
    );
    let client = SearchClient::connect(SearchBackend::Elasticsearch, &config).unwrap();
    assert_eq!(
        client.count("articles", &SearchQuery::match_all()).await.unwrap(),
        3
    );
}

#[tokio::test]
async fn test_all_nodes_unreachable() {
    let config = config_for(
        SearchBackend::Elasticsearch,
        vec!["http://127.0.0.1:1".to_string()],
    );
    let client = SearchClient::connect(SearchBackend::Elasticsearch, &config).unwrap();
    let err = client
        .count("articles", &SearchQuery::match_all())
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[rstest]
#[case(SearchBackend::Elasticsearch, json!({"number": "8.13.0"}), None)]
#[case(SearchBackend::OpenSearch, json!({"number": "2.11.0", "distribution": "opensearch"}), Some("opensearch"))]
#[tokio::test]
async fn test_ping_reads_cluster_info(
    #[case] backend: SearchBackend,
    #[case] version: serde_json::Value,
    #[case] distribution: Option<&str>,
) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "node-1",
            "cluster_name": "docker-cluster",
            "version": version
        })))
        .mount(&server)
        .await;

    let config = config_for(backend, vec![server.uri()]);
    let client = SearchClient::connect(backend, &config).unwrap();
    let info = client.ping().await.unwrap();
    assert_eq!(info.cluster_name, "docker-cluster");
    assert_eq!(info.distribution.as_deref(), distribution);
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_index_to_document_store_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/articles/_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 3})))
        .mount(&server)
        .await;
    mount_three_record_scroll(&server).await;

    let config = config_for(SearchBackend::Elasticsearch, vec![server.uri()]);
    let options = ConversionOptions::new("articles", "body").with_batch_size(2);
    let (store, report) = index_to_document_store(
        InMemoryDocumentStore::new(),
        SearchBackend::Elasticsearch,
        &config,
        options,
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.batch_sizes, vec![2, 1]);
    let docs: Vec<Document> = store.documents("documents").await;
    let markers: Vec<&str> = docs.iter().filter_map(Document::original_id).collect();
    assert_eq!(markers, vec!["a", "b", "c"]);
    assert_eq!(store.count_documents("documents").await.unwrap(), 3);
    assert!(docs.iter().all(|d| d.meta.contains_key(ORIGINAL_ID_KEY)));
}

#[tokio::test]
async fn test_conflicting_metadata_lists_never_contact_cluster() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(SearchBackend::Elasticsearch, vec![server.uri()]);
    let options = ConversionOptions::new("articles", "body")
        .include_fields(["a"])
        .exclude_fields(["b"]);
    let result = index_to_document_store(
        InMemoryDocumentStore::new(),
        SearchBackend::Elasticsearch,
        &config,
        options,
        None,
    )
    .await;
    assert!(result.is_err());
}
