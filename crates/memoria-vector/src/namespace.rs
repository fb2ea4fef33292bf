// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collection name to reference store table.
//!
//! Each collection gets one [`SqliteVectorStore`] with its own single-writer
//! connection. Requesting the same collection again returns the same store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use memoria_core::MemoriaError;
use memoria_storage::IN_MEMORY;
use tracing::debug;

use crate::reference::SqliteVectorStore;

#[derive(Debug, Default)]
pub struct CollectionNamespace {
    stores: Mutex<HashMap<String, Arc<SqliteVectorStore>>>,
}

impl CollectionNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bound to `collection`, created on first request.
    ///
    /// Fails with `InvalidInput` when the collection is already bound to a
    /// different dimension or database path.
    pub fn get_or_create(
        &self,
        collection: &str,
        dimension: usize,
        db_path: Option<&str>,
    ) -> Result<Arc<SqliteVectorStore>, MemoriaError> {
        let db_path = db_path.unwrap_or(IN_MEMORY);
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = stores.get(collection) {
            if existing.dimension() != dimension {
                return Err(MemoriaError::InvalidInput(format!(
                    "collection {collection} has dimension {}, requested {dimension}",
                    existing.dimension()
                )));
            }
            if existing.db_path() != db_path {
                return Err(MemoriaError::InvalidInput(format!(
                    "collection {collection} is stored at {}, requested {db_path}",
                    existing.db_path()
                )));
            }
            return Ok(Arc::clone(existing));
        }

        let store = Arc::new(SqliteVectorStore::new(collection, dimension, db_path));
        stores.insert(collection.to_string(), Arc::clone(&store));
        debug!(collection, dimension, "collection bound");
        Ok(store)
    }

    pub fn collections(&self) -> Vec<String> {
        let stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_core::VectorStore;
    use memoria_core::types::Payload;

    #[tokio::test]
    async fn same_name_returns_same_store() {
        let ns = CollectionNamespace::new();
        let a = ns.get_or_create("shared", 2, None).unwrap();
        let b = ns.get_or_create("shared", 2, None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        a.insert(&[vec![1.0, 0.0]], &["x".into()], &[Payload::new()])
            .await
            .unwrap();
        assert!(b.get("x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let ns = CollectionNamespace::new();
        let a = ns.get_or_create("a", 2, None).unwrap();
        let b = ns.get_or_create("b", 2, None).unwrap();
        a.insert(&[vec![1.0, 0.0]], &["x".into()], &[Payload::new()])
            .await
            .unwrap();
        assert!(b.get("x").await.unwrap().is_none());
        assert_eq!(ns.collections(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn dimension_conflict_is_invalid_input() {
        let ns = CollectionNamespace::new();
        ns.get_or_create("c", 2, None).unwrap();
        let err = ns.get_or_create("c", 3, None).unwrap_err();
        assert!(matches!(err, MemoriaError::InvalidInput(_)));
    }

    #[test]
    fn db_path_conflict_is_invalid_input() {
        let ns = CollectionNamespace::new();
        ns.get_or_create("c", 2, None).unwrap();
        let err = ns.get_or_create("c", 2, Some("/tmp/c.db")).unwrap_err();
        assert!(matches!(err, MemoriaError::InvalidInput(ref m) if m.contains("/tmp/c.db")));

        let explicit = ns.get_or_create("c", 2, Some(IN_MEMORY)).unwrap();
        assert_eq!(explicit.db_path(), IN_MEMORY);
    }
}
