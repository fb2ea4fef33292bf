// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavioural checks shared by every store implementation.
//!
//! Each check starts from an empty store and panics with a descriptive
//! message on the first violated expectation.

use serde_json::{Value, json};

use memoria_core::{
    HistoryEntry, HistoryStore, MemoriaError, Payload, SearchFilters, VectorStore,
};

/// Builds a payload from a JSON object literal.
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("payload must be a JSON object, got {other}"),
    }
}

fn ids(results: &[memoria_core::VectorStoreResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

/// Runs the full vector store contract against an empty two-dimensional store.
pub async fn vector_store_contract(store: &dyn VectorStore) {
    store.initialize().await.expect("initialize");
    store.initialize().await.expect("initialize is idempotent");

    let vectors = vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0]];
    let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let payloads = vec![
        payload(json!({"userId": "u1", "data": "first"})),
        payload(json!({"userId": "u1", "data": "second"})),
        payload(json!({"userId": "u2", "data": "third"})),
    ];
    store
        .insert(&vectors, &keys, &payloads)
        .await
        .expect("insert");

    let ranked = store.search(&[1.0, 0.0], 3, None).await.expect("search");
    assert_eq!(ids(&ranked), ["a", "b", "c"], "results ranked by cosine");
    assert!(ranked.iter().all(|r| r.score.is_some()), "search results carry scores");

    let top = store.search(&[1.0, 0.0], 1, None).await.expect("search");
    assert_eq!(ids(&top), ["a"], "limit caps results");

    let only_u2 = SearchFilters::new().with("userId", "u2");
    let filtered = store
        .search(&[1.0, 0.0], 10, Some(&only_u2))
        .await
        .expect("filtered search");
    assert_eq!(ids(&filtered), ["c"], "filters restrict results");

    vector_upsert_contract(store).await;
    vector_delete_contract(store).await;
    vector_dimension_contract(store).await;
    vector_user_id_contract(store).await;

    store.delete_col().await.expect("delete_col");
    let (left, count) = store.list(None, 100).await.expect("list after delete_col");
    assert!(left.is_empty() && count == 0, "delete_col empties the collection");
}

async fn vector_upsert_contract(store: &dyn VectorStore) {
    store
        .insert(
            &[vec![1.0, 0.0]],
            &["a".to_string()],
            &[payload(json!({"userId": "u1", "data": "rewritten"}))],
        )
        .await
        .expect("re-insert");
    let a = store.get("a").await.expect("get").expect("a exists");
    assert_eq!(a.payload["data"], json!("rewritten"), "insert replaces by id");
    assert_eq!(a.score, None, "get carries no score");

    let (_, count) = store.list(None, 100).await.expect("list");
    assert_eq!(count, 3, "re-insert does not duplicate");

    store
        .update("d", &[0.5, 0.5], &payload(json!({"userId": "u3"})))
        .await
        .expect("update of absent id");
    assert!(store.get("d").await.expect("get").is_some(), "update upserts");
}

async fn vector_delete_contract(store: &dyn VectorStore) {
    store.delete("d").await.expect("delete");
    store.delete("d").await.expect("delete is idempotent");
    assert!(store.get("d").await.expect("get").is_none(), "deleted id is gone");
    assert!(store.get("missing").await.expect("get").is_none());
}

async fn vector_dimension_contract(store: &dyn VectorStore) {
    let err = store
        .insert(
            &[vec![0.1, 0.2], vec![1.0, 0.0, 0.0]],
            &["ok".to_string(), "bad".to_string()],
            &[Payload::new(), Payload::new()],
        )
        .await
        .expect_err("wrong dimension is rejected");
    assert!(matches!(err, MemoriaError::DimensionMismatch { .. }), "got {err:?}");
    assert!(
        store.get("ok").await.expect("get").is_none(),
        "a rejected batch writes nothing"
    );

    let err = store
        .search(&[1.0], 5, None)
        .await
        .expect_err("wrong query dimension is rejected");
    assert!(matches!(err, MemoriaError::DimensionMismatch { .. }), "got {err:?}");
}

async fn vector_user_id_contract(store: &dyn VectorStore) {
    let first = store.get_user_id().await.expect("get_user_id");
    assert!(!first.is_empty());
    assert_eq!(store.get_user_id().await.expect("get_user_id"), first, "user id is stable");
    store.set_user_id("user-42").await.expect("set_user_id");
    assert_eq!(store.get_user_id().await.expect("get_user_id"), "user-42");
}

/// Runs the history store contract against an empty store.
pub async fn history_store_contract(store: &dyn HistoryStore) {
    store
        .add_history(HistoryEntry::new("m1", "ADD").new_value("likes tea"))
        .await
        .expect("add");
    store
        .add_history(
            HistoryEntry::new("m1", "UPDATE")
                .previous_value("likes tea")
                .new_value("likes coffee"),
        )
        .await
        .expect("add");
    store
        .add_history(HistoryEntry::new("m2", "ADD").new_value("lives in Oslo"))
        .await
        .expect("add");
    store
        .add_history(HistoryEntry::new("m2", "ADD").new_value("lives in Oslo"))
        .await
        .expect("duplicate entries are accepted");

    let m1 = store.get_history("m1").await.expect("get_history");
    let actions: Vec<&str> = m1.iter().map(|r| r.action.as_str()).collect();
    assert_eq!(actions, ["ADD", "UPDATE"], "history is in insertion order");
    assert_eq!(m1[1].previous_value.as_deref(), Some("likes tea"));
    assert!(!m1[0].is_deleted);

    assert_eq!(store.get_history("m2").await.expect("get_history").len(), 2);
    assert!(store.get_history("nope").await.expect("get_history").is_empty());

    store
        .add_history(HistoryEntry::new("m1", "DELETE").previous_value("likes coffee").deleted())
        .await
        .expect("add");
    let m1 = store.get_history("m1").await.expect("get_history");
    assert!(m1[2].is_deleted, "deletion flag round-trips");

    store.reset().await.expect("reset");
    assert!(store.get_history("m1").await.expect("get_history").is_empty(), "reset purges");
    store
        .add_history(HistoryEntry::new("m3", "ADD"))
        .await
        .expect("store is usable after reset");
    assert_eq!(store.get_history("m3").await.expect("get_history").len(), 1);
}
