// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process history log.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use memoria_core::{
    HistoryEntry, HistoryRecord, HistoryStore, MemoriaError, Provider, ProviderFamily,
};

/// History kept in a `Vec` for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Provider for InMemoryHistoryStore {
    fn provider_name(&self) -> &str {
        "memory"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::HistoryStore
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn add_history(&self, entry: HistoryEntry) -> Result<(), MemoriaError> {
        let mut records = self.records.lock().await;
        let id = records.last().map_or(1, |r| r.id + 1);
        debug!(memory_id = %entry.memory_id, action = %entry.action, id, "history appended");
        records.push(HistoryRecord::from_entry(id, entry));
        Ok(())
    }

    async fn get_history(&self, memory_id: &str) -> Result<Vec<HistoryRecord>, MemoriaError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .filter(|r| r.memory_id == memory_id)
            .cloned()
            .collect())
    }

    async fn reset(&self) -> Result<(), MemoriaError> {
        self.records.lock().await.clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), MemoriaError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_increase_from_one() {
        let store = InMemoryHistoryStore::new();
        store.add_history(HistoryEntry::new("m", "ADD")).await.unwrap();
        store.add_history(HistoryEntry::new("m", "UPDATE")).await.unwrap();
        let ids: Vec<i64> = store
            .get_history("m")
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, [1, 2]);
    }
}
