// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite history log.
//!
//! Schema:
//!
//! ```sql
//! memory_history(id INTEGER PRIMARY KEY AUTOINCREMENT, memory_id, previous_value,
//!                new_value, action, created_at, updated_at, is_deleted DEFAULT 0)
//! ```

use async_trait::async_trait;
use rusqlite::params;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use memoria_core::{
    HistoryEntry, HistoryRecord, HistoryStore, MemoriaError, Provider, ProviderFamily,
};
use memoria_storage::{Database, IN_MEMORY, map_tr_err};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS memory_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    memory_id TEXT NOT NULL,
    previous_value TEXT,
    new_value TEXT,
    action TEXT NOT NULL,
    created_at TEXT,
    updated_at TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_memory_history_memory_id ON memory_history(memory_id);";

/// History log in one SQLite database.
///
/// The database is opened and the table created on first use. Registered as
/// the `memory` history provider when `historyDbPath` is set.
#[derive(Debug)]
pub struct SqliteHistoryStore {
    db_path: String,
    db: OnceCell<Database>,
}

impl SqliteHistoryStore {
    pub fn new(db_path: impl Into<String>) -> Self {
        let db_path = db_path.into();
        info!(path = %db_path, "sqlite history store created");
        Self {
            db_path,
            db: OnceCell::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn path(&self) -> &str {
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
                debug!(path = %self.db_path, "history schema ready");
                Ok(db)
            })
            .await
    }
}

impl Provider for SqliteHistoryStore {
    fn provider_name(&self) -> &str {
        "memory"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::HistoryStore
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn add_history(&self, entry: HistoryEntry) -> Result<(), MemoriaError> {
        let memory_id = entry.memory_id.clone();
        let id = self
            .db()
            .await?
            .connection()
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                conn.execute(
                    "INSERT INTO memory_history
                        (memory_id, previous_value, new_value, action, created_at, updated_at, is_deleted)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        entry.memory_id,
                        entry.previous_value,
                        entry.new_value,
                        entry.action,
                        entry.created_at,
                        entry.updated_at,
                        i64::from(entry.is_deleted),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(memory_id = %memory_id, id, "history appended");
        Ok(())
    }

    async fn get_history(&self, memory_id: &str) -> Result<Vec<HistoryRecord>, MemoriaError> {
        let memory_id = memory_id.to_string();
        self.db()
            .await?
            .connection()
            .call(move |conn| -> Result<Vec<HistoryRecord>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, memory_id, previous_value, new_value, action, created_at, updated_at, is_deleted
                     FROM memory_history WHERE memory_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map(params![memory_id], |row| {
                        Ok(HistoryRecord {
                            id: row.get(0)?,
                            memory_id: row.get(1)?,
                            previous_value: row.get(2)?,
                            new_value: row.get(3)?,
                            action: row.get(4)?,
                            created_at: row.get(5)?,
                            updated_at: row.get(6)?,
                            is_deleted: row.get::<_, i64>(7)? != 0,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn reset(&self) -> Result<(), MemoriaError> {
        self.db()
            .await?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("DROP TABLE IF EXISTS memory_history;")?;
                conn.execute_batch(SCHEMA)
            })
            .await
            .map_err(map_tr_err)?;
        info!(path = %self.db_path, "history reset");
        Ok(())
    }

    async fn close(&self) -> Result<(), MemoriaError> {
        match self.db.get() {
            Some(db) => db.close().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_before_first_use_is_a_no_op() {
        let store = SqliteHistoryStore::in_memory();
        store.close().await.unwrap();
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn reset_restarts_ids() {
        let store = SqliteHistoryStore::in_memory();
        store.add_history(HistoryEntry::new("m", "ADD")).await.unwrap();
        store.add_history(HistoryEntry::new("m", "ADD")).await.unwrap();
        store.reset().await.unwrap();
        store.add_history(HistoryEntry::new("m", "ADD")).await.unwrap();
        let history = store.get_history("m").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, 1);
    }

    #[tokio::test]
    async fn timestamps_are_stored_verbatim() {
        let store = SqliteHistoryStore::in_memory();
        let entry = HistoryEntry::new("m", "ADD")
            .new_value("v")
            .timestamps("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
        store.add_history(entry).await.unwrap();
        let record = store.get_history("m").await.unwrap().remove(0);
        assert_eq!(record.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(record.updated_at.as_deref(), Some("2024-01-02T00:00:00Z"));
        assert_eq!(record.new_value.as_deref(), Some("v"));
    }
}
