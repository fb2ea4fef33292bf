// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supabase (PostgREST + pgvector) vector store.
//!
//! Expects a table `(id text primary key, embedding vector(N), metadata jsonb)`
//! named after the collection, a `match_vectors(query_embedding, match_count,
//! filter)` function, and a `memory_migrations(id int primary key, user_id text)`
//! table.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use memoria_config::VectorStoreConfig;
use memoria_config::defaults::DEFAULT_DIMENSION;
use memoria_core::traits::{ensure_batch, ensure_dimension};
use memoria_core::types::{Payload, SearchFilters, VectorStoreResult, matches_filters};
use memoria_core::{MemoriaError, Provider, ProviderFamily, VectorStore};

use crate::rest;
use crate::similarity::rank;

const MIGRATIONS_TABLE: &str = "memory_migrations";
const MATCH_FUNCTION: &str = "match_vectors";

#[derive(Debug, Deserialize)]
struct Row {
    id: Value,
    #[serde(default)]
    metadata: Option<Payload>,
    #[serde(default)]
    similarity: Option<f32>,
}

impl Row {
    fn into_result(self, scored: bool) -> VectorStoreResult {
        VectorStoreResult {
            id: rest::id_string(&self.id),
            payload: self.metadata.unwrap_or_default(),
            score: if scored { self.similarity } else { None },
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserRow {
    user_id: String,
}

#[derive(Debug)]
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_url: String,
    table: String,
    dimension: usize,
}

impl SupabaseStore {
    /// Reads `supabaseUrl`, `supabaseKey` and the optional `tableName`
    /// (defaults to the collection name).
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self, MemoriaError> {
        let url = config.get_str("supabaseUrl").ok_or_else(|| {
            MemoriaError::Validation("vectorStore.config.supabaseUrl is required".into())
        })?;
        let key = config.get_str("supabaseKey").ok_or_else(|| {
            MemoriaError::Validation("vectorStore.config.supabaseKey is required".into())
        })?;
        let bearer = format!("Bearer {key}");
        let client = rest::client(&[("apikey", key), ("authorization", bearer.as_str())])?;
        let table = config
            .get_str("tableName")
            .unwrap_or(&config.collection_name)
            .to_string();
        info!(table = %table, "supabase vector store created");

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            table,
            dimension: config.dimension_or(DEFAULT_DIMENSION),
        })
    }

    async fn stored_user_id(&self) -> Result<Option<String>, MemoriaError> {
        let request = self
            .client
            .get(self.table_url(MIGRATIONS_TABLE))
            .query(&[("select", "user_id"), ("id", "eq.1")]);
        let rows: Vec<UserRow> = rest::json(request, "supabase get user id").await?;
        Ok(rows.into_iter().next().map(|row| row.user_id))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.rest_url)
    }

    async fn upsert(&self, rows: Vec<Value>) -> Result<(), MemoriaError> {
        let request = self
            .client
            .post(self.table_url(&self.table))
            .header("prefer", "resolution=merge-duplicates")
            .json(&rows);
        rest::execute(request, "supabase upsert").await
    }
}

impl Provider for SupabaseStore {
    fn provider_name(&self) -> &str {
        "supabase"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::VectorStore
    }
}

#[async_trait]
impl VectorStore for SupabaseStore {
    async fn initialize(&self) -> Result<(), MemoriaError> {
        // Probe the table so a missing schema surfaces early.
        let request = self
            .client
            .get(self.table_url(&self.table))
            .query(&[("select", "id"), ("limit", "1")]);
        rest::execute(request, "supabase probe").await
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
        let rows = vectors
            .iter()
            .zip(ids)
            .zip(payloads)
            .map(|((v, id), p)| json!({"id": id, "embedding": v, "metadata": p}))
            .collect();
        self.upsert(rows).await?;
        debug!(table = %self.table, count = ids.len(), "rows upserted");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<VectorStoreResult>, MemoriaError> {
        ensure_dimension(None, query, self.dimension)?;
        let filter = filters.cloned().unwrap_or_default();
        let request = self
            .client
            .post(format!("{}/rpc/{MATCH_FUNCTION}", self.rest_url))
            .json(&json!({
                "query_embedding": query,
                "match_count": limit,
                "filter": filter,
            }));
        let rows: Vec<Row> = rest::json(request, "supabase match").await?;
        let mut results: Vec<VectorStoreResult> = rows
            .into_iter()
            .map(|r| r.into_result(true))
            .filter(|r| matches_filters(filters, &r.payload))
            .collect();
        rank(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorStoreResult>, MemoriaError> {
        let id_filter = format!("eq.{id}");
        let request = self
            .client
            .get(self.table_url(&self.table))
            .query(&[("select", "id,metadata"), ("id", id_filter.as_str())]);
        let rows: Vec<Row> = rest::json(request, "supabase get").await?;
        Ok(rows.into_iter().next().map(|r| r.into_result(false)))
    }

    async fn update(&self, id: &str, vector: &[f32], payload: &Payload) -> Result<(), MemoriaError> {
        ensure_dimension(Some(id), vector, self.dimension)?;
        self.upsert(vec![json!({"id": id, "embedding": vector, "metadata": payload})])
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), MemoriaError> {
        let request = self
            .client
            .delete(self.table_url(&self.table))
            .query(&[("id", format!("eq.{id}"))]);
        rest::execute(request, "supabase delete").await?;
        debug!(table = %self.table, id, "row deleted");
        Ok(())
    }

    async fn delete_col(&self) -> Result<(), MemoriaError> {
        // PostgREST refuses unfiltered deletes; this filter matches every row.
        let request = self
            .client
            .delete(self.table_url(&self.table))
            .query(&[("id", "not.is.null")]);
        rest::execute(request, "supabase delete all").await?;
        info!(table = %self.table, "all rows deleted");
        Ok(())
    }

    async fn list(
        &self,
        filters: Option<&SearchFilters>,
        limit: usize,
    ) -> Result<(Vec<VectorStoreResult>, usize), MemoriaError> {
        let mut query = vec![
            ("select".to_string(), "id,metadata".to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        if let Some(f) = filters.filter(|f| !f.is_empty()) {
            query.push(("metadata".to_string(), format!("cs.{}", serde_json::to_string(f)?)));
        }
        let request = self.client.get(self.table_url(&self.table)).query(&query);
        let rows: Vec<Row> = rest::json(request, "supabase list").await?;
        let results: Vec<VectorStoreResult> = rows
            .into_iter()
            .map(|r| r.into_result(false))
            .filter(|r| matches_filters(filters, &r.payload))
            .take(limit)
            .collect();
        let count = results.len();
        Ok((results, count))
    }

    async fn get_user_id(&self) -> Result<String, MemoriaError> {
        if let Some(user_id) = self.stored_user_id().await? {
            return Ok(user_id);
        }
        // Insert only if no row exists, then read back the winner.
        let user_id = uuid::Uuid::new_v4().to_string();
        let request = self
            .client
            .post(self.table_url(MIGRATIONS_TABLE))
            .header("prefer", "resolution=ignore-duplicates")
            .json(&json!([{"id": 1, "user_id": user_id}]));
        rest::execute(request, "supabase create user id").await?;
        Ok(self.stored_user_id().await?.unwrap_or(user_id))
    }

    async fn set_user_id(&self, user_id: &str) -> Result<(), MemoriaError> {
        let request = self
            .client
            .post(self.table_url(MIGRATIONS_TABLE))
            .header("prefer", "resolution=merge-duplicates")
            .json(&json!([{"id": 1, "user_id": user_id}]));
        rest::execute(request, "supabase set user id").await
    }
}
