// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit log of memory mutations.

use async_trait::async_trait;

use crate::error::MemoriaError;
use crate::traits::provider::Provider;
use crate::types::{HistoryEntry, HistoryRecord};

/// History log keyed by memory id.
///
/// Rows are never updated after insert; the log is purged only by [`reset`].
///
/// [`reset`]: HistoryStore::reset
#[async_trait]
pub trait HistoryStore: Provider {
    /// Appends an entry. Duplicate content is never an error.
    async fn add_history(&self, entry: HistoryEntry) -> Result<(), MemoriaError>;

    /// All entries for `memory_id` in insertion order.
    async fn get_history(&self, memory_id: &str) -> Result<Vec<HistoryRecord>, MemoriaError>;

    /// Destroys and recreates the whole log.
    async fn reset(&self) -> Result<(), MemoriaError>;

    /// Releases held resources. Safe to call more than once.
    async fn close(&self) -> Result<(), MemoriaError>;
}
