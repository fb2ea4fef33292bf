// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed reference vector store.
//!
//! One database per collection: `vectors(id, vector, payload)` with
//! little-endian f32 BLOBs, plus the one-row `memory_migrations` table
//! holding the collection's user id. Search is an exact scan.

use async_trait::async_trait;
use rusqlite::{OptionalExtension, params};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use memoria_config::VectorStoreConfig;
use memoria_config::defaults::DEFAULT_DIMENSION;
use memoria_core::traits::{ensure_batch, ensure_dimension};
use memoria_core::types::{Payload, SearchFilters, VectorStoreResult, matches_filters};
use memoria_core::{MemoriaError, Provider, ProviderFamily, VectorStore};
use memoria_storage::{Database, IN_MEMORY, map_tr_err};

use crate::similarity::{blob_to_vec, top_k, vec_to_blob};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS vectors (
    id TEXT PRIMARY KEY,
    vector BLOB NOT NULL,
    payload TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS memory_migrations (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    user_id TEXT NOT NULL
);";

const UPSERT: &str = "INSERT INTO vectors (id, vector, payload) VALUES (?1, ?2, ?3)
     ON CONFLICT(id) DO UPDATE SET vector = excluded.vector, payload = excluded.payload";

/// Reference vector store bound to one collection.
///
/// Construction does no I/O. The database is opened and the schema created
/// on first use, so calls issued before [`VectorStore::initialize`] wait for
/// readiness instead of failing.
#[derive(Debug)]
pub struct SqliteVectorStore {
    collection: String,
    dimension: usize,
    db_path: String,
    db: OnceCell<Database>,
}

impl SqliteVectorStore {
    pub fn new(collection: impl Into<String>, dimension: usize, db_path: impl Into<String>) -> Self {
        let store = Self {
            collection: collection.into(),
            dimension,
            db_path: db_path.into(),
            db: OnceCell::new(),
        };
        info!(
            collection = %store.collection,
            dimension,
            db_path = %store.db_path,
            "reference vector store created"
        );
        store
    }

    /// In-memory store, mostly for tests.
    pub fn in_memory(collection: impl Into<String>, dimension: usize) -> Self {
        Self::new(collection, dimension, IN_MEMORY)
    }

    /// Reads `collectionName`, `dimension` and the optional `dbPath`.
    pub fn from_config(config: &VectorStoreConfig) -> Self {
        Self::new(
            config.collection_name.clone(),
            config.dimension_or(DEFAULT_DIMENSION),
            config.get_str("dbPath").unwrap_or(IN_MEMORY),
        )
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    async fn db(&self) -> Result<&Database, MemoriaError> {
        self.db
            .get_or_try_init(|| async {
                let db = Database::open(&self.db_path).await?;
                db.connection()
                    .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch(SCHEMA) })
                    .await
                    .map_err(map_tr_err)?;
                debug!(collection = %self.collection, "vector schema ready");
                Ok(db)
            })
            .await
    }

    /// All rows in insertion order.
    async fn scan(&self) -> Result<Vec<(String, Vec<u8>, String)>, MemoriaError> {
        self.db()
            .await?
            .connection()
            .call(|conn| -> Result<_, rusqlite::Error> {
                let mut stmt = conn.prepare("SELECT id, vector, payload FROM vectors ORDER BY rowid")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn upsert_rows(&self, rows: Vec<(String, Vec<u8>, String)>) -> Result<(), MemoriaError> {
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(UPSERT)?;
                    for (id, blob, payload) in &rows {
                        stmt.execute(params![id, blob, payload])?;
                    }
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)
    }
}

fn parse_payload(text: &str) -> Result<Payload, MemoriaError> {
    Ok(serde_json::from_str(text)?)
}

impl Provider for SqliteVectorStore {
    fn provider_name(&self) -> &str {
        "memory"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::VectorStore
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn initialize(&self) -> Result<(), MemoriaError> {
        self.db().await.map(|_| ())
    }

    async fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[String],
        payloads: &[Payload],
    ) -> Result<(), MemoriaError> {
        ensure_batch(vectors, ids, payloads, self.dimension)?;
        let mut rows = Vec::with_capacity(ids.len());
        for ((vector, id), payload) in vectors.iter().zip(ids).zip(payloads) {
            rows.push((id.clone(), vec_to_blob(vector), serde_json::to_string(payload)?));
        }
        let count = rows.len();
        self.upsert_rows(rows).await?;
        debug!(collection = %self.collection, count, "vectors upserted");
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<VectorStoreResult>, MemoriaError> {
        ensure_dimension(None, query, self.dimension)?;
        let mut candidates = Vec::new();
        for (id, blob, payload) in self.scan().await? {
            candidates.push((id, blob_to_vec(&blob), parse_payload(&payload)?));
        }
        let results = top_k(query, candidates, limit, filters);
        debug!(collection = %self.collection, limit, returned = results.len(), "search");
        Ok(results)
    }

    async fn get(&self, id: &str) -> Result<Option<VectorStoreResult>, MemoriaError> {
        let id = id.to_string();
        let row = self
            .db()
            .await?
            .connection()
            .call(move |conn| -> Result<Option<(String, String)>, rusqlite::Error> {
                conn.query_row(
                    "SELECT id, payload FROM vectors WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;

        match row {
            Some((id, payload)) => Ok(Some(VectorStoreResult::unscored(id, parse_payload(&payload)?))),
            None => Ok(None),
        }
    }

    async fn update(&self, id: &str, vector: &[f32], payload: &Payload) -> Result<(), MemoriaError> {
        ensure_dimension(Some(id), vector, self.dimension)?;
        let row = (id.to_string(), vec_to_blob(vector), serde_json::to_string(payload)?);
        self.upsert_rows(vec![row]).await?;
        debug!(collection = %self.collection, id, "vector updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), MemoriaError> {
        let owned = id.to_string();
        let removed = self
            .db()
            .await?
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM vectors WHERE id = ?1", params![owned])
            })
            .await
            .map_err(map_tr_err)?;
        debug!(collection = %self.collection, id, removed, "vector deleted");
        Ok(())
    }

    async fn delete_col(&self) -> Result<(), MemoriaError> {
        self.db()
            .await?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("DROP TABLE IF EXISTS vectors;")?;
                conn.execute_batch(SCHEMA)
            })
            .await
            .map_err(map_tr_err)?;
        info!(collection = %self.collection, "collection dropped");
        Ok(())
    }

    async fn list(
        &self,
        filters: Option<&SearchFilters>,
        limit: usize,
    ) -> Result<(Vec<VectorStoreResult>, usize), MemoriaError> {
        let mut results = Vec::new();
        for (id, _, payload) in self.scan().await? {
            if results.len() >= limit {
                break;
            }
            let payload = parse_payload(&payload)?;
            if matches_filters(filters, &payload) {
                results.push(VectorStoreResult::unscored(id, payload));
            }
        }
        let count = results.len();
        Ok((results, count))
    }

    async fn get_user_id(&self) -> Result<String, MemoriaError> {
        let candidate = uuid::Uuid::new_v4().to_string();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<String, rusqlite::Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO memory_migrations (id, user_id) VALUES (1, ?1)",
                    params![candidate],
                )?;
                conn.query_row("SELECT user_id FROM memory_migrations WHERE id = 1", [], |row| {
                    row.get(0)
                })
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set_user_id(&self, user_id: &str) -> Result<(), MemoriaError> {
        let user_id = user_id.to_string();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO memory_migrations (id, user_id) VALUES (1, ?1)
                     ON CONFLICT(id) DO UPDATE SET user_id = excluded.user_id",
                    params![user_id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
