// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of a complete backend set from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use memoria_config::{HistoryStoreConfig, MemoryConfig, MemoryConfigInput, resolve_or_error};
use memoria_core::{Embedder, HistoryStore, Llm, MemoriaError, VectorStore};

use crate::registry::{EmbedderFactory, HistoryStoreFactory, LlmFactory, VectorStoreFactory};

/// The four factories used to build backends. Swap or extend entries with
/// `register` before calling [`MemoryBackends::build_with`].
#[derive(Debug, Default)]
pub struct Factories {
    pub embedders: EmbedderFactory,
    pub llms: LlmFactory,
    pub vector_stores: VectorStoreFactory,
    pub history_stores: HistoryStoreFactory,
}

/// A resolved configuration and the capability instances built from it.
pub struct MemoryBackends {
    pub config: Arc<MemoryConfig>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: Arc<dyn Llm>,
    pub vector_store: Arc<dyn VectorStore>,
    /// `None` when `disableHistory` is set.
    pub history_store: Option<Arc<dyn HistoryStore>>,
}

impl std::fmt::Debug for MemoryBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackends")
            .field("embedder", &self.embedder.provider_name())
            .field("llm", &self.llm.provider_name())
            .field("vector_store", &self.vector_store.provider_name())
            .field(
                "history_store",
                &self.history_store.as_ref().map(|h| h.provider_name().to_string()),
            )
            .finish_non_exhaustive()
    }
}

impl MemoryBackends {
    /// Resolves `input` against the defaults and builds every capability
    /// with the built-in factories.
    pub fn build(input: &MemoryConfigInput) -> Result<Self, MemoriaError> {
        Self::build_with(input, &Factories::default())
    }

    pub fn build_with(input: &MemoryConfigInput, factories: &Factories) -> Result<Self, MemoriaError> {
        let config = resolve_or_error(input)?;
        Self::from_config(Arc::new(config), factories)
    }

    /// Builds from an already resolved configuration.
    pub fn from_config(config: Arc<MemoryConfig>, factories: &Factories) -> Result<Self, MemoriaError> {
        let embedder = factories
            .embedders
            .create(&config.embedder.provider, &config.embedder.config)?;
        let llm = factories.llms.create(&config.llm.provider, &config.llm.config)?;
        let vector_store = factories
            .vector_stores
            .create(&config.vector_store.provider, &config.vector_store.config)?;

        let history_store = if config.disable_history {
            info!("history disabled");
            None
        } else {
            let history_config = history_config(&config);
            Some(
                factories
                    .history_stores
                    .create(&history_config.provider, &history_config)?,
            )
        };

        if config.enable_graph {
            warn!("enableGraph is set but no graph store backend is available; graph memory is skipped");
        }

        info!(
            embedder = %config.embedder.provider,
            llm = %config.llm.provider,
            vector_store = %config.vector_store.provider,
            collection = %config.vector_store.config.collection_name,
            history = history_store.is_some(),
            "memory backends ready"
        );

        Ok(Self {
            config,
            embedder,
            llm,
            vector_store,
            history_store,
        })
    }
}

/// History section with `agentHistoryName` filled from the top level when absent.
fn history_config(config: &MemoryConfig) -> HistoryStoreConfig {
    let mut history = config
        .history_store
        .clone()
        .unwrap_or_else(|| HistoryStoreConfig::new(memoria_config::defaults::DEFAULT_HISTORY_PROVIDER));
    if history.get_str("agentHistoryName").is_none() {
        history.config.insert(
            "agentHistoryName".to_string(),
            serde_json::Value::String(config.agent_history_name.clone()),
        );
    }
    history
}
