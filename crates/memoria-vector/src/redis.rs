// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis vector store using RediSearch (`FT.CREATE` / `FT.SEARCH` KNN).
//!
//! Records are hashes under `{collection}:{id}` with the JSON payload, the
//! f32-LE embedding and the `userId`/`agentId`/`runId` tags. Filters on those
//! tags run inside Redis. Other filter keys are applied to the returned
//! documents, so they can yield fewer than `limit` results.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use memoria_config::VectorStoreConfig;
use memoria_config::defaults::DEFAULT_DIMENSION;
use memoria_core::traits::{ensure_batch, ensure_dimension};
use memoria_core::types::{Payload, SearchFilters, VectorStoreResult, matches_filters};
use memoria_core::{MemoriaError, Provider, ProviderFamily, VectorStore};

use crate::similarity::{rank, vec_to_blob};

/// Payload keys indexed as TAG fields.
const TAG_FIELDS: &[&str] = &["userId", "agentId", "runId"];

pub struct RedisStore {
    client: Client,
    collection: String,
    dimension: usize,
    conn: OnceCell<MultiplexedConnection>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Reads `redisUrl`. Only parses the URL; no connection is made here.
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self, MemoriaError> {
        let url = config.get_str("redisUrl").ok_or_else(|| {
            MemoriaError::Validation("vectorStore.config.redisUrl is required".into())
        })?;
        let client = Client::open(url)
            .map_err(|e| MemoriaError::Validation(format!("invalid redisUrl: {e}")))?;
        info!(collection = %config.collection_name, "redis store created");
        Ok(Self {
            client,
            collection: config.collection_name.clone(),
            dimension: config.dimension_or(DEFAULT_DIMENSION),
            conn: OnceCell::new(),
        })
    }

    fn key(&self, id: &str) -> String {
        format!("{}:{id}", self.collection)
    }

    fn migrations_key(&self) -> String {
        format!("memory_migrations:{}", self.collection)
    }

    async fn conn(&self) -> Result<MultiplexedConnection, MemoriaError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let mut conn = self
                    .client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(MemoriaError::transport)?;
                self.create_index(&mut conn).await?;
                Ok::<_, MemoriaError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }

    async fn create_index(&self, conn: &mut MultiplexedConnection) -> Result<(), MemoriaError> {
        let mut cmd = redis::cmd("FT.CREATE");
        cmd.arg(&self.collection)
            .arg("ON")
            .arg("HASH")
            .arg("PREFIX")
            .arg(1)
            .arg(format!("{}:", self.collection))
            .arg("SCHEMA")
            .arg("id")
            .arg("TAG");
        for tag in TAG_FIELDS {
            cmd.arg(*tag).arg("TAG");
        }
        cmd.arg("embedding")
            .arg("VECTOR")
            .arg("FLAT")
            .arg(6)
            .arg("TYPE")
            .arg("FLOAT32")
            .arg("DIM")
            .arg(self.dimension)
            .arg("DISTANCE_METRIC")
            .arg("COSINE");

        let created: Result<Value, _> = cmd.query_async(conn).await;
        match created {
            Ok(_) => {
                info!(index = %self.collection, dimension = self.dimension, "redis index created");
                Ok(())
            }
            Err(e) if e.to_string().contains("Index already exists") => Ok(()),
            Err(e) => Err(MemoriaError::transport(e)),
        }
    }

    fn hset(&self, id: &str, vector: &[f32], payload: &Payload) -> Result<redis::Cmd, MemoriaError> {
        let mut cmd = redis::cmd("HSET");
        cmd.arg(self.key(id))
            .arg("id")
            .arg(id)
            .arg("payload")
            .arg(serde_json::to_string(payload)?)
            .arg("embedding")
            .arg(vec_to_blob(vector).as_slice());
        for tag in TAG_FIELDS {
            if let Some(value) = payload.get(*tag).and_then(serde_json::Value::as_str) {
                cmd.arg(*tag).arg(value);
            }
        }
        Ok(cmd)
    }

    /// Replaces whole hashes atomically.
    async fn upsert(&self, records: Vec<(String, redis::Cmd)>) -> Result<(), MemoriaError> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, hset) in records {
            pipe.cmd("DEL").arg(key).ignore();
            pipe.add_command(hset).ignore();
        }
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(MemoriaError::transport)?;
        Ok(())
    }

    async fn ft_search(&self, args: &[SearchArg]) -> Result<Vec<Document>, MemoriaError> {
        let mut conn = self.conn().await?;
        let mut cmd = redis::cmd("FT.SEARCH");
        cmd.arg(&self.collection);
        for arg in args {
            match arg {
                SearchArg::Text(s) => cmd.arg(s.as_str()),
                SearchArg::Blob(b) => cmd.arg(b.as_slice()),
            };
        }
        let reply: Value = cmd
            .query_async(&mut conn)
            .await
            .map_err(MemoriaError::transport)?;
        parse_search_reply(&reply)
    }
}

enum SearchArg {
    Text(String),
    Blob(Vec<u8>),
}

fn text(s: impl Into<String>) -> SearchArg {
    SearchArg::Text(s.into())
}

/// A document from an `FT.SEARCH` reply.
#[derive(Debug, Default, PartialEq)]
struct Document {
    key: String,
    fields: HashMap<String, String>,
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Double(d) => Some(d.to_string()),
        _ => None,
    }
}

/// Parses `[total, key, [field, value, ...], key, [...], ...]`.
fn parse_search_reply(reply: &Value) -> Result<Vec<Document>, MemoriaError> {
    let Value::Array(items) = reply else {
        return Err(MemoriaError::provider(format!(
            "unexpected FT.SEARCH reply: {reply:?}"
        )));
    };
    let mut docs = Vec::new();
    let mut iter = items.iter().skip(1);
    while let Some(key) = iter.next() {
        let mut doc = Document {
            key: value_to_string(key).unwrap_or_default(),
            fields: HashMap::new(),
        };
        if let Some(Value::Array(fields)) = iter.next() {
            for pair in fields.chunks_exact(2) {
                if let (Some(name), Some(value)) = (value_to_string(&pair[0]), value_to_string(&pair[1])) {
                    doc.fields.insert(name, value);
                }
            }
        }
        docs.push(doc);
    }
    Ok(docs)
}

/// Escapes a TAG value for the query language.
fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if !c.is_alphanumeric() && c != '_' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Query prefix for the tag part of a filter, `*` when there is none.
fn tag_query(filters: Option<&SearchFilters>) -> String {
    let clauses: Vec<String> = filters
        .map(|f| {
            f.iter()
                .filter(|(key, _)| TAG_FIELDS.contains(&key.as_str()))
                .filter_map(|(key, value)| {
                    value
                        .as_str()
                        .map(|v| format!("@{key}:{{{}}}", escape_tag(v)))
                })
                .collect()
        })
        .unwrap_or_default();
    if clauses.is_empty() {
        "*".to_string()
    } else {
        format!("({})", clauses.join(" "))
    }
}

fn into_result(doc: Document, scored: bool) -> Result<VectorStoreResult, MemoriaError> {
    let payload: Payload = match doc.fields.get("payload") {
        Some(text) => serde_json::from_str(text)?,
        None => Payload::new(),
    };
    let id = doc.fields.get("id").cloned().unwrap_or(doc.key);
    let score = if scored {
        doc.fields
            .get("vector_score")
            .and_then(|d| d.parse::<f32>().ok())
            .map(|distance| 1.0 - distance)
    } else {
        None
    };
    Ok(VectorStoreResult { id, payload, score })
}

impl Provider for RedisStore {
    fn provider_name(&self) -> &str {
        "redis"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::VectorStore
    }
}

#[async_trait]
impl VectorStore for RedisStore {
    async fn initialize(&self) -> Result<(), MemoriaError> {
        self.conn().await.map(|_| ())
    }

    async fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[String],
        payloads: &[Payload],
    ) -> Result<(), MemoriaError> {
        ensure_batch(vectors, ids, payloads, self.dimension)?;
        let mut records = Vec::with_capacity(ids.len());
        for ((vector, id), payload) in vectors.iter().zip(ids).zip(payloads) {
            records.push((self.key(id), self.hset(id, vector, payload)?));
        }
        self.upsert(records).await?;
        debug!(collection = %self.collection, count = ids.len(), "hashes upserted");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<VectorStoreResult>, MemoriaError> {
        ensure_dimension(None, query, self.dimension)?;
        let knn = format!(
            "{}=>[KNN {limit} @embedding $vec AS vector_score]",
            tag_query(filters)
        );
        let args = [
            text(knn),
            text("PARAMS"),
            text("2"),
            text("vec"),
            SearchArg::Blob(vec_to_blob(query)),
            text("SORTBY"),
            text("vector_score"),
            text("ASC"),
            text("RETURN"),
            text("3"),
            text("id"),
            text("payload"),
            text("vector_score"),
            text("LIMIT"),
            text("0"),
            text(limit.to_string()),
            text("DIALECT"),
            text("2"),
        ];
        let mut results = Vec::new();
        for doc in self.ft_search(&args).await? {
            let result = into_result(doc, true)?;
            if matches_filters(filters, &result.payload) {
                results.push(result);
            }
        }
        rank(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorStoreResult>, MemoriaError> {
        let mut conn = self.conn().await?;
        let fields: HashMap<String, String> = redis::cmd("HMGET")
            .arg(self.key(id))
            .arg("id")
            .arg("payload")
            .query_async::<Vec<Option<String>>>(&mut conn)
            .await
            .map_err(MemoriaError::transport)?
            .into_iter()
            .zip(["id", "payload"])
            .filter_map(|(value, name)| value.map(|v| (name.to_string(), v)))
            .collect();
        if fields.is_empty() {
            return Ok(None);
        }
        into_result(
            Document {
                key: id.to_string(),
                fields,
            },
            false,
        )
        .map(Some)
    }

    async fn update(&self, id: &str, vector: &[f32], payload: &Payload) -> Result<(), MemoriaError> {
        ensure_dimension(Some(id), vector, self.dimension)?;
        let hset = self.hset(id, vector, payload)?;
        self.upsert(vec![(self.key(id), hset)]).await
    }

    async fn delete(&self, id: &str) -> Result<(), MemoriaError> {
        let mut conn = self.conn().await?;
        let removed: i64 = redis::cmd("DEL")
            .arg(self.key(id))
            .query_async(&mut conn)
            .await
            .map_err(MemoriaError::transport)?;
        debug!(collection = %self.collection, id, removed, "hash deleted");
        Ok(())
    }

    async fn delete_col(&self) -> Result<(), MemoriaError> {
        let mut conn = self.conn().await?;
        let dropped: Result<Value, _> = redis::cmd("FT.DROPINDEX")
            .arg(&self.collection)
            .arg("DD")
            .query_async(&mut conn)
            .await;
        match dropped {
            Ok(_) => {}
            Err(e) if e.to_string().to_lowercase().contains("unknown index") => {}
            Err(e) => return Err(MemoriaError::transport(e)),
        }
        self.create_index(&mut conn).await?;
        info!(collection = %self.collection, "redis collection dropped");
        Ok(())
    }

    async fn list(
        &self,
        filters: Option<&SearchFilters>,
        limit: usize,
    ) -> Result<(Vec<VectorStoreResult>, usize), MemoriaError> {
        let args = [
            text(tag_query(filters)),
            text("RETURN"),
            text("2"),
            text("id"),
            text("payload"),
            text("LIMIT"),
            text("0"),
            text(limit.to_string()),
            text("DIALECT"),
            text("2"),
        ];
        let mut results = Vec::new();
        for doc in self.ft_search(&args).await? {
            let result = into_result(doc, false)?;
            if matches_filters(filters, &result.payload) && results.len() < limit {
                results.push(result);
            }
        }
        let count = results.len();
        Ok((results, count))
    }

    async fn get_user_id(&self) -> Result<String, MemoriaError> {
        let mut conn = self.conn().await?;
        let key = self.migrations_key();
        let candidate = uuid::Uuid::new_v4().to_string();
        let (_, user_id): (i64, String) = redis::pipe()
            .cmd("HSETNX")
            .arg(&key)
            .arg("user_id")
            .arg(candidate)
            .cmd("HGET")
            .arg(&key)
            .arg("user_id")
            .query_async(&mut conn)
            .await
            .map_err(MemoriaError::transport)?;
        Ok(user_id)
    }

    async fn set_user_id(&self, user_id: &str) -> Result<(), MemoriaError> {
        let mut conn = self.conn().await?;
        let _: i64 = redis::cmd("HSET")
            .arg(self.migrations_key())
            .arg("user_id")
            .arg(user_id)
            .query_async(&mut conn)
            .await
            .map_err(MemoriaError::transport)?;
        Ok(())
    }
}
