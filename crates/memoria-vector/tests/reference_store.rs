// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the SQLite reference vector store.

use std::sync::Arc;

use memoria_core::{MemoriaError, Payload, SearchFilters, VectorStore};
use memoria_test_utils::contract::{payload, vector_store_contract};
use memoria_vector::{CollectionNamespace, SqliteVectorStore};
use proptest::prelude::*;
use serde_json::json;

#[tokio::test]
async fn in_memory_store_satisfies_contract() {
    let store = SqliteVectorStore::in_memory("contract", 2);
    vector_store_contract(&store).await;
}

#[tokio::test]
async fn file_store_satisfies_contract() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vectors.db");
    let store = SqliteVectorStore::new("contract", 2, path.to_string_lossy());
    vector_store_contract(&store).await;
}

#[tokio::test]
async fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vectors.db").to_string_lossy().into_owned();
    {
        let store = SqliteVectorStore::new("memories", 2, path.clone());
        store
            .insert(
                &[vec![0.6, 0.8]],
                &["kept".to_string()],
                &[payload(json!({"userId": "u1"}))],
            )
            .await
            .unwrap();
        store.set_user_id("owner").await.unwrap();
    }
    let reopened = SqliteVectorStore::new("memories", 2, path);
    let kept = reopened.get("kept").await.unwrap().unwrap();
    assert_eq!(kept.payload["userId"], json!("u1"));
    assert_eq!(reopened.get_user_id().await.unwrap(), "owner");
}

#[tokio::test]
async fn calls_before_initialize_wait_for_readiness() {
    let store = Arc::new(SqliteVectorStore::in_memory("lazy", 2));
    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .insert(&[vec![1.0, 0.0]], &["x".to_string()], &[Payload::new()])
                .await
        })
    };
    let reader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.list(None, 10).await })
    };
    writer.await.unwrap().unwrap();
    reader.await.unwrap().unwrap();
    assert!(store.get("x").await.unwrap().is_some());
}

#[tokio::test]
async fn filters_require_every_key() {
    let store = SqliteVectorStore::in_memory("filters", 2);
    store
        .insert(
            &[vec![1.0, 0.0], vec![0.9, 0.1]],
            &["a".to_string(), "b".to_string()],
            &[
                payload(json!({"userId": "u1", "agentId": "x"})),
                payload(json!({"userId": "u1"})),
            ],
        )
        .await
        .unwrap();
    let both = SearchFilters::new().with("userId", "u1").with("agentId", "x");
    let hits = store.search(&[1.0, 0.0], 10, Some(&both)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a");

    let (listed, count) = store.list(Some(&both), 10).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(listed[0].id, "a");
}

#[tokio::test]
async fn list_count_is_number_returned() {
    let store = SqliteVectorStore::in_memory("counts", 2);
    let ids: Vec<String> = (0..5).map(|i| format!("id-{i}")).collect();
    let vectors = vec![vec![1.0, 0.0]; 5];
    let payloads = vec![Payload::new(); 5];
    store.insert(&vectors, &ids, &payloads).await.unwrap();

    let (items, count) = store.list(None, 3).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(count, 3);
}

#[tokio::test]
async fn shared_namespace_sees_writes_from_other_handles() {
    let namespace = CollectionNamespace::new();
    let writer = namespace.get_or_create("shared", 2, None).unwrap();
    let reader = namespace.get_or_create("shared", 2, None).unwrap();
    writer
        .insert(&[vec![0.0, 1.0]], &["n".to_string()], &[Payload::new()])
        .await
        .unwrap();
    assert!(reader.get("n").await.unwrap().is_some());

    let err = namespace.get_or_create("shared", 3, None).unwrap_err();
    assert!(matches!(err, MemoriaError::InvalidInput(_)));
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn repeated_inserts_keep_one_record_per_id(
        ids in proptest::collection::vec("[a-e]", 1..20),
    ) {
        let unique: std::collections::BTreeSet<String> = ids.iter().cloned().collect();
        let (count, stored) = runtime().block_on(async {
            let store = SqliteVectorStore::in_memory("prop", 2);
            for (n, id) in ids.iter().enumerate() {
                let p = payload(json!({"n": n}));
                store.insert(&[vec![1.0, 0.0]], &[id.clone()], &[p]).await.unwrap();
            }
            let (_, count) = store.list(None, 100).await.unwrap();
            let last = ids.last().cloned().unwrap_or_default();
            let stored = store.get(&last).await.unwrap().map(|r| r.payload["n"].clone());
            (count, stored)
        });
        prop_assert_eq!(count, unique.len());
        prop_assert_eq!(stored, Some(json!(ids.len() - 1)));
    }
}
