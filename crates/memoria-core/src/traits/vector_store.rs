// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector storage contract.
//!
//! Every backend follows the same policy for dimension checks: the whole call
//! fails with [`MemoriaError::DimensionMismatch`] before anything is written.

use async_trait::async_trait;

use crate::error::MemoriaError;
use crate::traits::provider::Provider;
use crate::types::{Payload, SearchFilters, VectorStoreResult};

/// Default `limit` for [`VectorStore::search`].
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Default `limit` for [`VectorStore::list`].
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Similarity search and CRUD over one collection of `(id, vector, payload)` records.
#[async_trait]
pub trait VectorStore: Provider {
    /// Idempotent setup (schema creation, remote collection lookup).
    async fn initialize(&self) -> Result<(), MemoriaError>;

    /// Upserts records by id. All three slices must have equal length.
    async fn insert(
        &self,
        vectors: &[Vec<f32>],
        ids: &[String],
        payloads: &[Payload],
    ) -> Result<(), MemoriaError>;

    /// Top `limit` records by cosine similarity to `query`, restricted to
    /// payloads matching `filters`.
    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<VectorStoreResult>, MemoriaError>;

    /// Exact lookup by id.
    async fn get(&self, id: &str) -> Result<Option<VectorStoreResult>, MemoriaError>;

    /// Replaces vector and payload for `id` (creates it when absent).
    async fn update(&self, id: &str, vector: &[f32], payload: &Payload)
    -> Result<(), MemoriaError>;

    /// Removes `id`. Deleting an absent id succeeds.
    async fn delete(&self, id: &str) -> Result<(), MemoriaError>;

    /// Drops every record in the collection.
    async fn delete_col(&self) -> Result<(), MemoriaError>;

    /// Unranked listing. The count is the number of items returned.
    async fn list(
        &self,
        filters: Option<&SearchFilters>,
        limit: usize,
    ) -> Result<(Vec<VectorStoreResult>, usize), MemoriaError>;

    /// Reads the collection's user-id slot.
    async fn get_user_id(&self) -> Result<String, MemoriaError>;

    /// Overwrites the collection's user-id slot.
    async fn set_user_id(&self, user_id: &str) -> Result<(), MemoriaError>;
}

/// Fails with `DimensionMismatch` unless `vector.len() == dimension`.
pub fn ensure_dimension(
    id: Option<&str>,
    vector: &[f32],
    dimension: usize,
) -> Result<(), MemoriaError> {
    if vector.len() != dimension {
        return Err(MemoriaError::DimensionMismatch {
            id: id.map(str::to_string),
            expected: dimension,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Validates an insert batch: equal lengths and every vector of `dimension`.
///
/// Runs before any write so a rejected batch leaves the collection unchanged.
pub fn ensure_batch(
    vectors: &[Vec<f32>],
    ids: &[String],
    payloads: &[Payload],
    dimension: usize,
) -> Result<(), MemoriaError> {
    if vectors.len() != ids.len() || ids.len() != payloads.len() {
        return Err(MemoriaError::InvalidInput(format!(
            "insert requires equal lengths, got {} vectors, {} ids, {} payloads",
            vectors.len(),
            ids.len(),
            payloads.len()
        )));
    }
    for (vector, id) in vectors.iter().zip(ids) {
        ensure_dimension(Some(id), vector, dimension)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_batch_rejects_length_mismatch() {
        let err = ensure_batch(&[vec![1.0, 0.0]], &[], &[Payload::new()], 2).unwrap_err();
        assert!(matches!(err, MemoriaError::InvalidInput(_)));
    }

    #[test]
    fn ensure_batch_names_first_offending_id() {
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
        let ids = vec!["ok".to_string(), "bad".to_string()];
        let payloads = vec![Payload::new(), Payload::new()];
        match ensure_batch(&vectors, &ids, &payloads, 2).unwrap_err() {
            MemoriaError::DimensionMismatch { id, expected, actual } => {
                assert_eq!(id.as_deref(), Some("bad"));
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ensure_dimension_accepts_exact_length() {
        assert!(ensure_dimension(None, &[0.0; 4], 4).is_ok());
        assert!(ensure_dimension(None, &[0.0; 3], 4).is_err());
    }
}
