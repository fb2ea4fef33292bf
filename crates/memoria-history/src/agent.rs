// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named history agents.
//!
//! An [`AgentNamespace`] maps agent names to independent history logs, each
//! a [`SqliteHistoryStore`] with its own connection. [`AgentHistoryStore`]
//! is the `cloudflare` history provider: a handle onto one named agent,
//! resolved on first use.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use memoria_config::HistoryStoreConfig;
use memoria_config::defaults::DEFAULT_AGENT_HISTORY_NAME;
use memoria_core::{
    HistoryEntry, HistoryRecord, HistoryStore, MemoriaError, Provider, ProviderFamily,
};
use memoria_storage::IN_MEMORY;

use crate::sqlite::SqliteHistoryStore;

/// Agent name to history log table.
#[derive(Debug, Default)]
pub struct AgentNamespace {
    agents: Mutex<HashMap<String, Arc<SqliteHistoryStore>>>,
    root: Option<PathBuf>,
}

impl AgentNamespace {
    /// Agents with in-memory logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Agents persisted as `{root}/{name}.db`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            agents: Mutex::default(),
            root: Some(root.into()),
        }
    }

    /// The log for `name`, created on first request.
    pub fn agent(&self, name: &str) -> Arc<SqliteHistoryStore> {
        let mut agents = self.agents.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = agents.get(name) {
            return Arc::clone(existing);
        }
        let path = match &self.root {
            Some(root) => root
                .join(format!("{}.db", file_stem(name)))
                .to_string_lossy()
                .into_owned(),
            None => IN_MEMORY.to_string(),
        };
        let store = Arc::new(SqliteHistoryStore::new(path));
        agents.insert(name.to_string(), Arc::clone(&store));
        debug!(agent = name, "history agent bound");
        store
    }

    /// Unbinds `name` and closes its log. Handles still holding the agent
    /// see a closed store; new requests get a fresh log.
    pub async fn close_agent(&self, name: &str) -> Result<(), MemoriaError> {
        let removed = self
            .agents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        match removed {
            Some(agent) => {
                debug!(agent = name, "history agent closed");
                agent.close().await
            }
            None => Ok(()),
        }
    }

    pub fn agents(&self) -> Vec<String> {
        let agents = self.agents.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = agents.keys().cloned().collect();
        names.sort();
        names
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// History store delegating to one named agent.
///
/// The agent's log belongs to the namespace; closing a handle only drops
/// this handle's reference to it.
#[derive(Debug)]
pub struct AgentHistoryStore {
    namespace: Arc<AgentNamespace>,
    name: String,
    agent: Mutex<Option<Arc<SqliteHistoryStore>>>,
}

impl AgentHistoryStore {
    pub fn new(namespace: Arc<AgentNamespace>, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            agent: Mutex::new(None),
        }
    }

    /// Reads `agentHistoryName`, falling back to `memory-history`.
    pub fn from_config(config: &HistoryStoreConfig, namespace: Arc<AgentNamespace>) -> Self {
        let name = config
            .get_str("agentHistoryName")
            .unwrap_or(DEFAULT_AGENT_HISTORY_NAME);
        Self::new(namespace, name)
    }

    pub fn agent_name(&self) -> &str {
        &self.name
    }

    fn agent(&self) -> Arc<SqliteHistoryStore> {
        let mut slot = self.agent.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slot.get_or_insert_with(|| self.namespace.agent(&self.name)))
    }
}

impl Provider for AgentHistoryStore {
    fn provider_name(&self) -> &str {
        "cloudflare"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::HistoryStore
    }
}

#[async_trait]
impl HistoryStore for AgentHistoryStore {
    async fn add_history(&self, entry: HistoryEntry) -> Result<(), MemoriaError> {
        self.agent().add_history(entry).await
    }

    async fn get_history(&self, memory_id: &str) -> Result<Vec<HistoryRecord>, MemoriaError> {
        self.agent().get_history(memory_id).await
    }

    async fn reset(&self) -> Result<(), MemoriaError> {
        self.agent().reset().await
    }

    async fn close(&self) -> Result<(), MemoriaError> {
        let released = self
            .agent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            debug!(agent = %self.name, "history handle released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_agent() {
        let namespace = AgentNamespace::new();
        let a = namespace.agent("memory-history");
        let b = namespace.agent("memory-history");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(namespace.agents(), ["memory-history"]);
    }

    #[test]
    fn agent_files_use_safe_names() {
        let namespace = AgentNamespace::with_root("/tmp/agents");
        let agent = namespace.agent("team/a b");
        assert!(agent.path().ends_with("team_a_b.db"));
    }

    #[test]
    fn config_name_falls_back_to_default() {
        let namespace = Arc::new(AgentNamespace::new());
        let store = AgentHistoryStore::from_config(&HistoryStoreConfig::new("cloudflare"), namespace);
        assert_eq!(store.agent_name(), DEFAULT_AGENT_HISTORY_NAME);
    }
}
