// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supabase (PostgREST) history log.
//!
//! Expects a table with the `memory_history` columns; `id` is a
//! database-generated identity.

use async_trait::async_trait;
use tracing::{debug, info};

use memoria_config::HistoryStoreConfig;
use memoria_core::{
    HistoryEntry, HistoryRecord, HistoryStore, MemoriaError, Provider, ProviderFamily,
};

use crate::rest;

const DEFAULT_TABLE: &str = "memory_history";

#[derive(Debug)]
pub struct SupabaseHistoryStore {
    client: reqwest::Client,
    table_url: String,
}

impl SupabaseHistoryStore {
    /// Reads `supabaseUrl`, `supabaseKey` and the optional `tableName`.
    pub fn from_config(config: &HistoryStoreConfig) -> Result<Self, MemoriaError> {
        let url = config.get_str("supabaseUrl").ok_or_else(|| {
            MemoriaError::Validation("historyStore.config.supabaseUrl is required".into())
        })?;
        let key = config.get_str("supabaseKey").ok_or_else(|| {
            MemoriaError::Validation("historyStore.config.supabaseKey is required".into())
        })?;
        let table = config.get_str("tableName").unwrap_or(DEFAULT_TABLE);
        let bearer = format!("Bearer {key}");
        let client = rest::client(&[("apikey", key), ("authorization", bearer.as_str())])?;
        info!(table, "supabase history store created");
        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{table}", url.trim_end_matches('/')),
        })
    }
}

impl Provider for SupabaseHistoryStore {
    fn provider_name(&self) -> &str {
        "supabase"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::HistoryStore
    }
}

#[async_trait]
impl HistoryStore for SupabaseHistoryStore {
    async fn add_history(&self, entry: HistoryEntry) -> Result<(), MemoriaError> {
        let memory_id = entry.memory_id.clone();
        let request = self.client.post(&self.table_url).json(&entry);
        rest::send(request, "supabase history insert").await?;
        debug!(memory_id = %memory_id, "history appended");
        Ok(())
    }

    async fn get_history(&self, memory_id: &str) -> Result<Vec<HistoryRecord>, MemoriaError> {
        let memory_filter = format!("eq.{memory_id}");
        let request = self.client.get(&self.table_url).query(&[
            ("select", "*"),
            ("memory_id", memory_filter.as_str()),
            ("order", "id.asc"),
        ]);
        rest::json(request, "supabase history select").await
    }

    async fn reset(&self) -> Result<(), MemoriaError> {
        // PostgREST refuses unfiltered deletes.
        let request = self.client.delete(&self.table_url).query(&[("id", "gte.0")]);
        rest::send(request, "supabase history reset").await?;
        info!(table_url = %self.table_url, "history reset");
        Ok(())
    }

    async fn close(&self) -> Result<(), MemoriaError> {
        Ok(())
    }
}
