// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Qdrant vector store over the REST API.
//!
//! The collection is created with cosine distance on first use. The user id
//! lives in the `memory_migrations` collection as point 1.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use memoria_config::VectorStoreConfig;
use memoria_config::defaults::DEFAULT_DIMENSION;
use memoria_core::traits::{ensure_batch, ensure_dimension};
use memoria_core::types::{Payload, SearchFilters, VectorStoreResult, matches_filters};
use memoria_core::{MemoriaError, Provider, ProviderFamily, VectorStore};

use crate::rest;
use crate::similarity::rank;

const MIGRATIONS_COLLECTION: &str = "memory_migrations";

#[derive(Debug, Deserialize)]
struct Reply<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct Point {
    id: Value,
    #[serde(default)]
    payload: Option<Payload>,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    points: Vec<Point>,
}

impl Point {
    fn into_result(self, scored: bool) -> VectorStoreResult {
        VectorStoreResult {
            id: rest::id_string(&self.id),
            payload: self.payload.unwrap_or_default(),
            score: if scored { self.score } else { None },
        }
    }
}

/// Equality filter in Qdrant's `must`/`match` form.
fn qdrant_filter(filters: Option<&SearchFilters>) -> Option<Value> {
    let filters = filters.filter(|f| !f.is_empty())?;
    let must: Vec<Value> = filters
        .iter()
        .map(|(key, value)| json!({"key": key, "match": {"value": value}}))
        .collect();
    Some(json!({"must": must}))
}

#[derive(Debug)]
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    dimension: usize,
    ready: OnceCell<()>,
    user_id_lock: Mutex<()>,
}

impl QdrantStore {
    /// Reads `url` and the optional `apiKey`.
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self, MemoriaError> {
        let url = config
            .get_str("url")
            .ok_or_else(|| MemoriaError::Validation("vectorStore.config.url is required".into()))?;
        let client = match config.get_str("apiKey") {
            Some(key) => rest::client(&[("api-key", key)])?,
            None => rest::client(&[])?,
        };
        info!(collection = %config.collection_name, url, "qdrant store created");
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            collection: config.collection_name.clone(),
            dimension: config.dimension_or(DEFAULT_DIMENSION),
            ready: OnceCell::new(),
            user_id_lock: Mutex::new(()),
        })
    }

    async fn stored_user_id(&self) -> Result<Option<String>, MemoriaError> {
        let url = format!("{}/points/1", self.collection_url(MIGRATIONS_COLLECTION));
        let response = rest::send_raw(self.client.get(&url)).await?;
        if rest::is_not_found(&response) {
            return Ok(None);
        }
        let response = rest::check(response, "qdrant get user id").await?;
        let reply: Reply<Option<Point>> = response.json().await.map_err(MemoriaError::transport)?;
        Ok(reply
            .result
            .and_then(|p| p.payload)
            .and_then(|p| p.get("user_id").and_then(Value::as_str).map(str::to_string)))
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{collection}", self.base_url)
    }

    fn points_url(&self) -> String {
        format!("{}/points", self.collection_url(&self.collection))
    }

    /// Creates `collection` unless it already exists.
    async fn ensure_collection(&self, collection: &str, size: usize) -> Result<(), MemoriaError> {
        let url = self.collection_url(collection);
        let response = rest::send_raw(self.client.get(&url)).await?;
        if !rest::is_not_found(&response) {
            rest::check(response, "qdrant get collection").await?;
            return Ok(());
        }
        let body = json!({"vectors": {"size": size, "distance": "Cosine"}});
        rest::execute(self.client.put(&url).json(&body), "qdrant create collection").await?;
        info!(collection, size, "qdrant collection created");
        Ok(())
    }

    async fn ready(&self) -> Result<(), MemoriaError> {
        self.ready
            .get_or_try_init(|| async {
                self.ensure_collection(&self.collection, self.dimension).await?;
                self.ensure_collection(MIGRATIONS_COLLECTION, 1).await
            })
            .await
            .map(|_| ())
    }

    async fn upsert(&self, points: Vec<Value>) -> Result<(), MemoriaError> {
        self.ready().await?;
        let request = self
            .client
            .put(self.points_url())
            .query(&[("wait", "true")])
            .json(&json!({"points": points}));
        rest::execute(request, "qdrant upsert").await
    }
}

impl Provider for QdrantStore {
    fn provider_name(&self) -> &str {
        "qdrant"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::VectorStore
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn initialize(&self) -> Result<(), MemoriaError> {
        self.ready().await
    }

    async fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[String],
        payloads: &[Payload],
    ) -> Result<(), MemoriaError> {
        ensure_batch(vectors, ids, payloads, self.dimension)?;
        if ids.is_empty() {
            return Ok(());
        }
        let points = vectors
            .iter()
            .zip(ids)
            .zip(payloads)
            .map(|((v, id), p)| json!({"id": id, "vector": v, "payload": p}))
            .collect();
        self.upsert(points).await?;
        debug!(collection = %self.collection, count = ids.len(), "points upserted");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<VectorStoreResult>, MemoriaError> {
        ensure_dimension(None, query, self.dimension)?;
        self.ready().await?;
        let mut body = json!({"vector": query, "limit": limit, "with_payload": true});
        if let Some(filter) = qdrant_filter(filters) {
            body["filter"] = filter;
        }
        let request = self
            .client
            .post(format!("{}/search", self.points_url()))
            .json(&body);
        let reply: Reply<Vec<Point>> = rest::json(request, "qdrant search").await?;
        let mut results: Vec<VectorStoreResult> = reply
            .result
            .into_iter()
            .map(|p| p.into_result(true))
            .filter(|r| matches_filters(filters, &r.payload))
            .collect();
        rank(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorStoreResult>, MemoriaError> {
        self.ready().await?;
        let response =
            rest::send_raw(self.client.get(format!("{}/{id}", self.points_url()))).await?;
        if rest::is_not_found(&response) {
            return Ok(None);
        }
        let response = rest::check(response, "qdrant get point").await?;
        let reply: Reply<Option<Point>> = response.json().await.map_err(MemoriaError::transport)?;
        Ok(reply.result.map(|p| p.into_result(false)))
    }

    async fn update(&self, id: &str, vector: &[f32], payload: &Payload) -> Result<(), MemoriaError> {
        ensure_dimension(Some(id), vector, self.dimension)?;
        self.upsert(vec![json!({"id": id, "vector": vector, "payload": payload})])
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), MemoriaError> {
        self.ready().await?;
        let request = self
            .client
            .post(format!("{}/delete", self.points_url()))
            .query(&[("wait", "true")])
            .json(&json!({"points": [id]}));
        rest::execute(request, "qdrant delete").await?;
        debug!(collection = %self.collection, id, "point deleted");
        Ok(())
    }

    async fn delete_col(&self) -> Result<(), MemoriaError> {
        let url = self.collection_url(&self.collection);
        let response = rest::send_raw(self.client.delete(&url)).await?;
        if !rest::is_not_found(&response) {
            rest::check(response, "qdrant delete collection").await?;
        }
        // Recreate so the store stays readable as empty.
        self.ensure_collection(&self.collection, self.dimension).await?;
        info!(collection = %self.collection, "qdrant collection dropped");
        Ok(())
    }

    async fn list(
        &self,
        filters: Option<&SearchFilters>,
        limit: usize,
    ) -> Result<(Vec<VectorStoreResult>, usize), MemoriaError> {
        self.ready().await?;
        let mut body = json!({"limit": limit, "with_payload": true, "with_vector": false});
        if let Some(filter) = qdrant_filter(filters) {
            body["filter"] = filter;
        }
        let request = self
            .client
            .post(format!("{}/scroll", self.points_url()))
            .json(&body);
        let reply: Reply<ScrollResult> = rest::json(request, "qdrant scroll").await?;
        let results: Vec<VectorStoreResult> = reply
            .result
            .points
            .into_iter()
            .map(|p| p.into_result(false))
            .filter(|r| matches_filters(filters, &r.payload))
            .take(limit)
            .collect();
        let count = results.len();
        Ok((results, count))
    }

    async fn get_user_id(&self) -> Result<String, MemoriaError> {
        self.ready().await?;
        // No conditional write in Qdrant; first use is serialized per store
        // and the stored value is returned.
        let _guard = self.user_id_lock.lock().await;
        if let Some(user_id) = self.stored_user_id().await? {
            return Ok(user_id);
        }
        let user_id = uuid::Uuid::new_v4().to_string();
        self.set_user_id(&user_id).await?;
        Ok(self.stored_user_id().await?.unwrap_or(user_id))
    }

    async fn set_user_id(&self, user_id: &str) -> Result<(), MemoriaError> {
        self.ready().await?;
        let request = self
            .client
            .put(format!("{}/points", self.collection_url(MIGRATIONS_COLLECTION)))
            .query(&[("wait", "true")])
            .json(&json!({"points": [{"id": 1, "vector": [0.0], "payload": {"user_id": user_id}}]}));
        rest::execute(request, "qdrant set user id").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_translates_to_must_clauses() {
        let filters = SearchFilters::new().with("userId", "u1");
        let filter = qdrant_filter(Some(&filters)).unwrap();
        assert_eq!(
            filter,
            json!({"must": [{"key": "userId", "match": {"value": "u1"}}]})
        );
        assert!(qdrant_filter(Some(&SearchFilters::new())).is_none());
        assert!(qdrant_filter(None).is_none());
    }

    #[test]
    fn numeric_ids_render_as_strings() {
        let point = Point {
            id: json!(7),
            payload: None,
            score: Some(0.5),
        };
        let result = point.into_result(false);
        assert_eq!(result.id, "7");
        assert_eq!(result.score, None);
    }
}
