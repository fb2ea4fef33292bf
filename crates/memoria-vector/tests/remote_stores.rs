// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP-backed vector stores against wiremock servers.

use memoria_config::VectorStoreConfig;
use memoria_core::{MemoriaError, Payload, SearchFilters, VectorStore};
use memoria_test_utils::contract::payload;
use memoria_vector::{QdrantStore, SupabaseStore, VectorizeStore};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_PATH: &str = "/accounts/acc-1/vectorize/v2/indexes/memories";

fn vectorize(server: &MockServer) -> VectorizeStore {
    let config = VectorStoreConfig::new("memories", 2)
        .with("accountId", "acc-1")
        .with("apiToken", "cf-token")
        .with("baseUrl", server.uri());
    VectorizeStore::from_config(&config).unwrap()
}

fn qdrant(server: &MockServer) -> QdrantStore {
    let config = VectorStoreConfig::new("memories", 2)
        .with("url", server.uri())
        .with("apiKey", "q-key");
    QdrantStore::from_config(&config).unwrap()
}

fn supabase(server: &MockServer) -> SupabaseStore {
    let config = VectorStoreConfig::new("memories", 2)
        .with("supabaseUrl", server.uri())
        .with("supabaseKey", "sb-key");
    SupabaseStore::from_config(&config).unwrap()
}

async fn mount_qdrant_collections(server: &MockServer) {
    for name in ["memories", "memory_migrations"] {
        Mock::given(method("GET"))
            .and(path(format!("/collections/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn vectorize_search_ranks_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{INDEX_PATH}/query")))
        .and(header("authorization", "Bearer cf-token"))
        .and(body_partial_json(json!({"topK": 5, "filter": {"userId": "u1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "result": {"matches": [
                {"id": "low", "score": 0.2, "metadata": {"userId": "u1"}},
                {"id": "high", "score": 0.9, "metadata": {"userId": "u1"}},
                {"id": "other", "score": 0.95, "metadata": {"userId": "u2"}}
            ]}
        })))
        .mount(&server)
        .await;

    let store = vectorize(&server);
    let filters = SearchFilters::new().with("userId", "u1");
    let results = store.search(&[1.0, 0.0], 5, Some(&filters)).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["high", "low"]);
}

#[tokio::test]
async fn vectorize_insert_sends_ndjson() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{INDEX_PATH}/upsert")))
        .and(header("content-type", "application/x-ndjson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "errors": [], "result": {"mutationId": "m"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = vectorize(&server);
    store
        .insert(
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            &["a".to_string(), "b".to_string()],
            &[Payload::new(), Payload::new()],
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert_eq!(body.lines().count(), 2);
}

#[tokio::test]
async fn vectorize_failure_envelope_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{INDEX_PATH}/delete_by_ids")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{"code": 1000, "message": "index not found"}],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = vectorize(&server).delete("a").await.unwrap_err();
    assert!(matches!(err, MemoriaError::Provider { .. }));
    assert!(err.to_string().contains("index not found"));
}

#[tokio::test]
async fn vectorize_user_id_is_not_applicable() {
    let server = MockServer::start().await;
    let store = vectorize(&server);
    assert!(matches!(
        store.get_user_id().await.unwrap_err(),
        MemoriaError::NotApplicable { .. }
    ));
    assert!(matches!(
        store.set_user_id("x").await.unwrap_err(),
        MemoriaError::NotApplicable { .. }
    ));
}

#[tokio::test]
async fn vectorize_rejects_wrong_dimension_before_any_request() {
    let server = MockServer::start().await;
    let store = vectorize(&server);
    let err = store
        .insert(&[vec![1.0, 0.0, 0.0]], &["a".to_string()], &[Payload::new()])
        .await
        .unwrap_err();
    assert!(matches!(err, MemoriaError::DimensionMismatch { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn qdrant_creates_missing_collections_on_first_use() {
    let server = MockServer::start().await;
    for name in ["memories", "memory_migrations"] {
        Mock::given(method("GET"))
            .and(path(format!("/collections/{name}")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
    }
    Mock::given(method("PUT"))
        .and(path("/collections/memories"))
        .and(header("api-key", "q-key"))
        .and(body_partial_json(json!({"vectors": {"size": 2, "distance": "Cosine"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/collections/memory_migrations"))
        .and(body_partial_json(json!({"vectors": {"size": 1}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .expect(1)
        .mount(&server)
        .await;

    let store = qdrant(&server);
    store.initialize().await.unwrap();
    store.initialize().await.unwrap();
}

#[tokio::test]
async fn qdrant_search_translates_filters() {
    let server = MockServer::start().await;
    mount_qdrant_collections(&server).await;
    Mock::given(method("POST"))
        .and(path("/collections/memories/points/search"))
        .and(body_partial_json(json!({
            "limit": 2,
            "filter": {"must": [{"key": "userId", "match": {"value": "u1"}}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"id": "b", "score": 0.5, "payload": {"userId": "u1"}},
                {"id": "a", "score": 0.8, "payload": {"userId": "u1"}}
            ]
        })))
        .mount(&server)
        .await;

    let store = qdrant(&server);
    let filters = SearchFilters::new().with("userId", "u1");
    let results = store.search(&[0.0, 1.0], 2, Some(&filters)).await.unwrap();
    assert_eq!(results[0].id, "a");
    assert_eq!(results[0].score, Some(0.8));
    assert_eq!(results[1].id, "b");
}

#[tokio::test]
async fn qdrant_get_missing_point_is_none() {
    let server = MockServer::start().await;
    mount_qdrant_collections(&server).await;
    Mock::given(method("GET"))
        .and(path("/collections/memories/points/nope"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(qdrant(&server).get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn qdrant_user_id_is_created_once_missing() {
    let server = MockServer::start().await;
    mount_qdrant_collections(&server).await;
    Mock::given(method("GET"))
        .and(path("/collections/memory_migrations/points/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/collections/memory_migrations/points"))
        .and(query_param("wait", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let user_id = qdrant(&server).get_user_id().await.unwrap();
    assert_eq!(user_id.len(), 36);
}

#[tokio::test]
async fn qdrant_concurrent_first_user_ids_agree() {
    let server = MockServer::start().await;
    mount_qdrant_collections(&server).await;
    Mock::given(method("GET"))
        .and(path("/collections/memory_migrations/points/1"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/memory_migrations/points/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"id": 1, "payload": {"user_id": "stored"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/collections/memory_migrations/points"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let store = qdrant(&server);
    let (a, b) = tokio::join!(store.get_user_id(), store.get_user_id());
    assert_eq!(a.unwrap(), "stored");
    assert_eq!(b.unwrap(), "stored");
}

#[tokio::test]
async fn qdrant_server_error_is_provider_error() {
    let server = MockServer::start().await;
    mount_qdrant_collections(&server).await;
    Mock::given(method("POST"))
        .and(path("/collections/memories/points/scroll"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = qdrant(&server).list(None, 10).await.unwrap_err();
    assert!(matches!(err, MemoriaError::Provider { .. }));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn supabase_upsert_merges_duplicates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/memories"))
        .and(header("apikey", "sb-key"))
        .and(header("authorization", "Bearer sb-key"))
        .and(header("prefer", "resolution=merge-duplicates"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    supabase(&server)
        .update("a", &[1.0, 0.0], &payload(json!({"data": "x"})))
        .await
        .unwrap();
}

#[tokio::test]
async fn supabase_search_calls_match_function() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/match_vectors"))
        .and(body_partial_json(json!({"match_count": 3, "filter": {"userId": "u1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "metadata": {"userId": "u1"}, "similarity": 0.3},
            {"id": "b", "metadata": {"userId": "u1"}, "similarity": 0.7}
        ])))
        .mount(&server)
        .await;

    let filters = SearchFilters::new().with("userId", "u1");
    let results = supabase(&server)
        .search(&[1.0, 0.0], 3, Some(&filters))
        .await
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["b", "a"]);
}

#[tokio::test]
async fn supabase_get_and_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/memories"))
        .and(query_param("id", "eq.a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "metadata": {"data": "x"}}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/memories"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "metadata": {}},
            {"id": 2, "metadata": {}}
        ])))
        .mount(&server)
        .await;

    let store = supabase(&server);
    let a = store.get("a").await.unwrap().unwrap();
    assert_eq!(a.payload["data"], json!("x"));

    let (items, count) = store.list(None, 2).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(items[0].id, "1");
}

#[tokio::test]
async fn supabase_user_id_reads_migrations_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/memory_migrations"))
        .and(query_param("id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"user_id": "owner"}])))
        .mount(&server)
        .await;

    assert_eq!(supabase(&server).get_user_id().await.unwrap(), "owner");
}

#[tokio::test]
async fn supabase_user_id_insert_keeps_existing_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/memory_migrations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/memory_migrations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"user_id": "first-writer"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/memory_migrations"))
        .and(header("prefer", "resolution=ignore-duplicates"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(supabase(&server).get_user_id().await.unwrap(), "first-writer");
}

#[test]
fn missing_required_keys_are_validation_errors() {
    let bare = VectorStoreConfig::new("memories", 2);
    assert!(matches!(
        QdrantStore::from_config(&bare).unwrap_err(),
        MemoriaError::Validation(_)
    ));
    assert!(matches!(
        SupabaseStore::from_config(&bare).unwrap_err(),
        MemoriaError::Validation(_)
    ));
    assert!(matches!(
        VectorizeStore::from_config(&bare).unwrap_err(),
        MemoriaError::Validation(_)
    ));
}

