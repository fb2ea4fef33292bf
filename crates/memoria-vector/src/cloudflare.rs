// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloudflare Vectorize (v2 REST API).
//!
//! Vectorize has no per-collection user id and no way to drop an index from
//! the data plane: `get_user_id`/`set_user_id` are `NotApplicable` and
//! `delete_col` only logs a warning.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use memoria_config::VectorStoreConfig;
use memoria_config::defaults::DEFAULT_DIMENSION;
use memoria_core::traits::{ensure_batch, ensure_dimension};
use memoria_core::types::{Payload, SearchFilters, VectorStoreResult, matches_filters};
use memoria_core::{MemoriaError, Provider, ProviderFamily, VectorStore};

use crate::rest;
use crate::similarity::rank;

const API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
const BACKEND: &str = "cloudflare vectorize";

/// Envelope around every Cloudflare API response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct StoredVector {
    id: String,
    #[serde(default)]
    metadata: Option<Payload>,
}

impl<T> Envelope<T> {
    fn into_result(self, what: &str) -> Result<Option<T>, MemoriaError> {
        if self.success {
            return Ok(self.result);
        }
        let detail = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(MemoriaError::provider(format!("{what} failed: {detail}")))
    }
}

/// Vector store backed by a Vectorize index.
#[derive(Debug)]
pub struct VectorizeStore {
    client: reqwest::Client,
    index_url: String,
    index: String,
    dimension: usize,
}

impl VectorizeStore {
    /// Reads `accountId`, `apiToken`, optional `indexName` (defaults to the
    /// collection name) and optional `baseUrl`.
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self, MemoriaError> {
        let account_id = config.get_str("accountId").ok_or_else(|| {
            MemoriaError::Validation("vectorStore.config.accountId is required".into())
        })?;
        let token = config.get_str("apiToken").ok_or_else(|| {
            MemoriaError::Validation("vectorStore.config.apiToken is required".into())
        })?;
        let index = config
            .get_str("indexName")
            .unwrap_or(&config.collection_name)
            .to_string();
        let base = config.get_str("baseUrl").unwrap_or(API_BASE_URL);

        let bearer = format!("Bearer {token}");
        let client = rest::client(&[("authorization", bearer.as_str())])?;
        let index_url = format!(
            "{}/accounts/{account_id}/vectorize/v2/indexes/{index}",
            base.trim_end_matches('/')
        );
        info!(index = %index, "vectorize store created");

        Ok(Self {
            client,
            index_url,
            index,
            dimension: config.dimension_or(DEFAULT_DIMENSION),
        })
    }

    async fn upsert(&self, records: Vec<Value>) -> Result<(), MemoriaError> {
        let body = records
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let request = self
            .client
            .post(format!("{}/upsert", self.index_url))
            .header("content-type", "application/x-ndjson")
            .body(body);
        let envelope: Envelope<Value> = rest::json(request, "vectorize upsert").await?;
        envelope.into_result("vectorize upsert")?;
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<Match>, MemoriaError> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "returnMetadata": "all",
        });
        if let Some(f) = filters.filter(|f| !f.is_empty()) {
            body["filter"] = serde_json::to_value(f)?;
        }
        let request = self
            .client
            .post(format!("{}/query", self.index_url))
            .json(&body);
        let envelope: Envelope<QueryResult> = rest::json(request, "vectorize query").await?;
        Ok(envelope
            .into_result("vectorize query")?
            .map(|r| r.matches)
            .unwrap_or_default())
    }
}

fn record(id: &str, vector: &[f32], payload: &Payload) -> Value {
    json!({"id": id, "values": vector, "metadata": payload})
}

impl Provider for VectorizeStore {
    fn provider_name(&self) -> &str {
        "cloudflare"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::VectorStore
    }
}

#[async_trait]
impl VectorStore for VectorizeStore {
    async fn initialize(&self) -> Result<(), MemoriaError> {
        debug!(index = %self.index, "vectorize index is managed externally");
        Ok(())
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
        let records = vectors
            .iter()
            .zip(ids)
            .zip(payloads)
            .map(|((v, id), p)| record(id, v, p))
            .collect();
        self.upsert(records).await?;
        debug!(index = %self.index, count = ids.len(), "vectors upserted");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<VectorStoreResult>, MemoriaError> {
        ensure_dimension(None, query, self.dimension)?;
        let mut results: Vec<VectorStoreResult> = self
            .query(query, limit, filters)
            .await?
            .into_iter()
            .map(|m| VectorStoreResult {
                id: m.id,
                payload: m.metadata.unwrap_or_default(),
                score: m.score,
            })
            .filter(|r| matches_filters(filters, &r.payload))
            .collect();
        rank(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorStoreResult>, MemoriaError> {
        let request = self
            .client
            .post(format!("{}/get_by_ids", self.index_url))
            .json(&json!({"ids": [id]}));
        let envelope: Envelope<Vec<StoredVector>> =
            rest::json(request, "vectorize get_by_ids").await?;
        Ok(envelope
            .into_result("vectorize get_by_ids")?
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|v| VectorStoreResult::unscored(v.id, v.metadata.unwrap_or_default())))
    }

    async fn update(&self, id: &str, vector: &[f32], payload: &Payload) -> Result<(), MemoriaError> {
        ensure_dimension(Some(id), vector, self.dimension)?;
        self.upsert(vec![record(id, vector, payload)]).await
    }

    async fn delete(&self, id: &str) -> Result<(), MemoriaError> {
        let request = self
            .client
            .post(format!("{}/delete_by_ids", self.index_url))
            .json(&json!({"ids": [id]}));
        let envelope: Envelope<Value> = rest::json(request, "vectorize delete_by_ids").await?;
        envelope.into_result("vectorize delete_by_ids")?;
        debug!(index = %self.index, id, "vector deleted");
        Ok(())
    }

    async fn delete_col(&self) -> Result<(), MemoriaError> {
        warn!(
            index = %self.index,
            "delete_col is not supported for Vectorize; delete the index with the Cloudflare dashboard or wrangler"
        );
        Ok(())
    }

    async fn list(
        &self,
        filters: Option<&SearchFilters>,
        limit: usize,
    ) -> Result<(Vec<VectorStoreResult>, usize), MemoriaError> {
        // Vectorize cannot enumerate; a zero-vector query stands in.
        let zero = vec![0.0_f32; self.dimension];
        let results: Vec<VectorStoreResult> = self
            .query(&zero, limit, filters)
            .await?
            .into_iter()
            .map(|m| VectorStoreResult::unscored(m.id, m.metadata.unwrap_or_default()))
            .filter(|r| matches_filters(filters, &r.payload))
            .take(limit)
            .collect();
        let count = results.len();
        Ok((results, count))
    }

    async fn get_user_id(&self) -> Result<String, MemoriaError> {
        Err(MemoriaError::NotApplicable {
            operation: "get_user_id",
            backend: BACKEND,
        })
    }

    async fn set_user_id(&self, _user_id: &str) -> Result<(), MemoriaError> {
        Err(MemoriaError::NotApplicable {
            operation: "set_user_id",
            backend: BACKEND,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use wiremock::MockServer;

    #[tokio::test]
    #[traced_test]
    async fn delete_col_only_warns() {
        let server = MockServer::start().await;
        let config = VectorStoreConfig::new("memories", 2)
            .with("accountId", "acc")
            .with("apiToken", "token")
            .with("baseUrl", server.uri());
        let store = VectorizeStore::from_config(&config).unwrap();
        store.delete_col().await.unwrap();
        assert!(server.received_requests().await.unwrap().is_empty());
        assert!(logs_contain("delete_col is not supported"));
    }

    #[test]
    fn index_name_overrides_collection() {
        let config = VectorStoreConfig::new("memories", 2)
            .with("accountId", "acc")
            .with("apiToken", "token")
            .with("indexName", "prod-index");
        let store = VectorizeStore::from_config(&config).unwrap();
        assert!(store.index_url.ends_with("/accounts/acc/vectorize/v2/indexes/prod-index"));
        assert!(store.index_url.starts_with(API_BASE_URL));
    }
}
