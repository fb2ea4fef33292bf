// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup and lifecycle.
//!
//! Do NOT open a second `Connection` to the same file for writes.

use memoria_core::MemoriaError;
use tokio_rusqlite::Connection;
use tracing::debug;

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Convert a tokio-rusqlite error into `MemoriaError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MemoriaError {
    MemoriaError::Storage {
        source: Box::new(e),
    }
}

/// A single-writer SQLite handle.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Connection,
    path: String,
}

impl Database {
    /// Opens `path`, or a private in-memory database for [`IN_MEMORY`].
    ///
    /// File databases are switched to WAL with a busy timeout.
    pub async fn open(path: &str) -> Result<Self, MemoriaError> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory().await
        } else {
            Connection::open(path).await
        }
        .map_err(|e| MemoriaError::Storage {
            source: Box::new(e),
        })?;

        if path != IN_MEMORY {
            conn.call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;",
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        }

        debug!(path, "database opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }

    /// Closes the background connection. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), MemoriaError> {
        self.conn.clone().close().await.map_err(map_tr_err)?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn in_memory_database_runs_statements() {
        let db = Database::open(IN_MEMORY).await.unwrap();
        assert!(db.is_in_memory());
        let value: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 41 + 1", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn file_database_uses_wal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());

        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn close_is_repeatable_and_later_calls_fail() {
        let db = Database::open(IN_MEMORY).await.unwrap();
        db.close().await.unwrap();
        db.close().await.unwrap();

        let result = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err);
        assert!(matches!(result, Err(MemoriaError::Storage { .. })));
    }
}
