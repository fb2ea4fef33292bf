// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registry: one lookup table per capability family.
//!
//! Each factory maps a lowercased provider name to a constructor. Lookups
//! are case-insensitive for every family. Construction never performs I/O;
//! stores that need a connection open it on first use.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use memoria_config::defaults::DEFAULT_DIMENSION;
use memoria_config::{EmbedderConfig, HistoryStoreConfig, LlmConfig, VectorStoreConfig};
use memoria_core::{Embedder, HistoryStore, Llm, MemoriaError, ProviderFamily, VectorStore};
use memoria_history::{
    AgentHistoryStore, AgentNamespace, InMemoryHistoryStore, SqliteHistoryStore,
    SupabaseHistoryStore,
};
use memoria_providers::{
    AnthropicChat, GoogleChat, GoogleEmbedder, OllamaChat, OllamaEmbedder, OpenAiChat,
    OpenAiEmbedder,
};
use memoria_vector::{CollectionNamespace, QdrantStore, RedisStore, SupabaseStore, VectorizeStore};

/// Builds a capability instance from its configuration section.
pub type Constructor<C, T> = Arc<dyn Fn(&C) -> Result<Arc<T>, MemoriaError> + Send + Sync>;

/// Provider name to constructor table for one family.
pub struct Registry<C, T: ?Sized> {
    family: ProviderFamily,
    entries: BTreeMap<String, Constructor<C, T>>,
}

impl<C, T: ?Sized> Registry<C, T> {
    pub fn new(family: ProviderFamily) -> Self {
        Self {
            family,
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces the constructor for `name`.
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&C) -> Result<Arc<T>, MemoriaError> + Send + Sync + 'static,
    {
        self.entries
            .insert(name.to_lowercase(), Arc::new(constructor));
    }

    /// Builds the provider registered under `name`.
    pub fn create(&self, name: &str, config: &C) -> Result<Arc<T>, MemoriaError> {
        let constructor = self.entries.get(&name.to_lowercase()).ok_or_else(|| {
            MemoriaError::UnsupportedProvider {
                family: self.family,
                name: name.to_string(),
            }
        })?;
        debug!(family = %self.family, provider = name, "creating provider");
        constructor(config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted.
    pub fn providers(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl<C, T: ?Sized> fmt::Debug for Registry<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("family", &self.family)
            .field("providers", &self.providers())
            .finish()
    }
}

// --- Embedders ---

#[derive(Debug)]
pub struct EmbedderFactory {
    registry: Registry<EmbedderConfig, dyn Embedder>,
}

impl Default for EmbedderFactory {
    fn default() -> Self {
        let mut registry: Registry<EmbedderConfig, dyn Embedder> =
            Registry::new(ProviderFamily::Embedder);
        registry.register("openai", |c| Ok(Arc::new(OpenAiEmbedder::openai(c)?)));
        registry.register("together", |c| Ok(Arc::new(OpenAiEmbedder::together(c)?)));
        registry.register("cloudflare", |c| Ok(Arc::new(OpenAiEmbedder::cloudflare(c)?)));
        registry.register("ollama", |c| Ok(Arc::new(OllamaEmbedder::new(c)?)));
        registry.register("google", |c| Ok(Arc::new(GoogleEmbedder::new(c)?)));
        Self { registry }
    }
}

impl EmbedderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, provider: &str, config: &EmbedderConfig) -> Result<Arc<dyn Embedder>, MemoriaError> {
        self.registry.create(provider, config)
    }

    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&EmbedderConfig) -> Result<Arc<dyn Embedder>, MemoriaError> + Send + Sync + 'static,
    {
        self.registry.register(name, constructor);
    }

    pub fn providers(&self) -> Vec<String> {
        self.registry.providers()
    }
}

// --- LLMs ---

#[derive(Debug)]
pub struct LlmFactory {
    registry: Registry<LlmConfig, dyn Llm>,
}

impl Default for LlmFactory {
    fn default() -> Self {
        let mut registry: Registry<LlmConfig, dyn Llm> = Registry::new(ProviderFamily::Llm);
        registry.register("openai", |c| Ok(Arc::new(OpenAiChat::openai(c)?)));
        registry.register("openai_structured", |c| Ok(Arc::new(OpenAiChat::openai_structured(c)?)));
        registry.register("groq", |c| Ok(Arc::new(OpenAiChat::groq(c)?)));
        registry.register("lmstudio", |c| Ok(Arc::new(OpenAiChat::lmstudio(c)?)));
        registry.register("lmstudio_structured", |c| {
            Ok(Arc::new(OpenAiChat::lmstudio_structured(c)?))
        });
        registry.register("anthropic", |c| Ok(Arc::new(AnthropicChat::new(c)?)));
        registry.register("ollama", |c| Ok(Arc::new(OllamaChat::new(c)?)));
        registry.register("google", |c| Ok(Arc::new(GoogleChat::new(c)?)));
        Self { registry }
    }
}

impl LlmFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, provider: &str, config: &LlmConfig) -> Result<Arc<dyn Llm>, MemoriaError> {
        self.registry.create(provider, config)
    }

    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&LlmConfig) -> Result<Arc<dyn Llm>, MemoriaError> + Send + Sync + 'static,
    {
        self.registry.register(name, constructor);
    }

    pub fn providers(&self) -> Vec<String> {
        self.registry.providers()
    }
}

// --- Vector stores ---

/// Vector store factory. `memory` stores are shared per collection through
/// the factory's [`CollectionNamespace`].
#[derive(Debug)]
pub struct VectorStoreFactory {
    registry: Registry<VectorStoreConfig, dyn VectorStore>,
    namespace: Arc<CollectionNamespace>,
}

impl Default for VectorStoreFactory {
    fn default() -> Self {
        Self::with_namespace(Arc::new(CollectionNamespace::new()))
    }
}

impl VectorStoreFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(namespace: Arc<CollectionNamespace>) -> Self {
        let mut registry: Registry<VectorStoreConfig, dyn VectorStore> =
            Registry::new(ProviderFamily::VectorStore);
        let collections = Arc::clone(&namespace);
        registry.register("memory", move |c: &VectorStoreConfig| {
            let store = collections.get_or_create(
                &c.collection_name,
                c.dimension_or(DEFAULT_DIMENSION),
                c.get_str("dbPath"),
            )?;
            Ok(store as Arc<dyn VectorStore>)
        });
        registry.register("cloudflare", |c| Ok(Arc::new(VectorizeStore::from_config(c)?)));
        registry.register("qdrant", |c| Ok(Arc::new(QdrantStore::from_config(c)?)));
        registry.register("supabase", |c| Ok(Arc::new(SupabaseStore::from_config(c)?)));
        registry.register("redis", |c| Ok(Arc::new(RedisStore::from_config(c)?)));
        Self {
            registry,
            namespace,
        }
    }

    pub fn namespace(&self) -> &Arc<CollectionNamespace> {
        &self.namespace
    }

    pub fn create(
        &self,
        provider: &str,
        config: &VectorStoreConfig,
    ) -> Result<Arc<dyn VectorStore>, MemoriaError> {
        self.registry.create(provider, config)
    }

    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&VectorStoreConfig) -> Result<Arc<dyn VectorStore>, MemoriaError>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register(name, constructor);
    }

    pub fn providers(&self) -> Vec<String> {
        self.registry.providers()
    }
}

// --- History stores ---

/// History store factory. `cloudflare` stores are named agents in the
/// factory's [`AgentNamespace`]; `memory` is in-process unless
/// `historyDbPath` points at a SQLite file.
#[derive(Debug)]
pub struct HistoryStoreFactory {
    registry: Registry<HistoryStoreConfig, dyn HistoryStore>,
    agents: Arc<AgentNamespace>,
}

impl Default for HistoryStoreFactory {
    fn default() -> Self {
        Self::with_agents(Arc::new(AgentNamespace::new()))
    }
}

impl HistoryStoreFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agents(agents: Arc<AgentNamespace>) -> Self {
        let mut registry: Registry<HistoryStoreConfig, dyn HistoryStore> =
            Registry::new(ProviderFamily::HistoryStore);
        registry.register("memory", |c: &HistoryStoreConfig| {
            Ok(match c.get_str("historyDbPath") {
                Some(path) => Arc::new(SqliteHistoryStore::new(path)) as Arc<dyn HistoryStore>,
                None => Arc::new(InMemoryHistoryStore::new()),
            })
        });
        let namespace = Arc::clone(&agents);
        registry.register("cloudflare", move |c| {
            Ok(Arc::new(AgentHistoryStore::from_config(c, Arc::clone(&namespace))))
        });
        registry.register("supabase", |c| Ok(Arc::new(SupabaseHistoryStore::from_config(c)?)));
        Self { registry, agents }
    }

    pub fn agents(&self) -> &Arc<AgentNamespace> {
        &self.agents
    }

    pub fn create(
        &self,
        provider: &str,
        config: &HistoryStoreConfig,
    ) -> Result<Arc<dyn HistoryStore>, MemoriaError> {
        self.registry.create(provider, config)
    }

    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&HistoryStoreConfig) -> Result<Arc<dyn HistoryStore>, MemoriaError>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register(name, constructor);
    }

    pub fn providers(&self) -> Vec<String> {
        self.registry.providers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_provider_sets() {
        assert_eq!(
            EmbedderFactory::new().providers(),
            ["cloudflare", "google", "ollama", "openai", "together"]
        );
        assert_eq!(
            LlmFactory::new().providers(),
            [
                "anthropic",
                "google",
                "groq",
                "lmstudio",
                "lmstudio_structured",
                "ollama",
                "openai",
                "openai_structured"
            ]
        );
        assert_eq!(
            VectorStoreFactory::new().providers(),
            ["cloudflare", "memory", "qdrant", "redis", "supabase"]
        );
        assert_eq!(
            HistoryStoreFactory::new().providers(),
            ["cloudflare", "memory", "supabase"]
        );
    }

    #[test]
    fn unknown_name_is_unsupported_provider() {
        let err = VectorStoreFactory::new()
            .create("made-up", &VectorStoreConfig::new("memories", 2))
            .err()
            .expect("made-up is not registered");
        match err {
            MemoriaError::UnsupportedProvider { family, name } => {
                assert_eq!(family, ProviderFamily::VectorStore);
                assert_eq!(name, "made-up");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            LlmFactory::new()
                .create("made-up", &LlmConfig::new("k"))
                .err()
                .expect("made-up is not registered")
                .to_string(),
            "unsupported llm provider: made-up"
        );
        let embedder = EmbedderConfig {
            api_key: "k".into(),
            model: None,
            account_id: None,
            url: None,
        };
        assert!(matches!(
            EmbedderFactory::new()
                .create("made-up", &embedder)
                .err()
                .expect("made-up is not registered"),
            MemoriaError::UnsupportedProvider { family: ProviderFamily::Embedder, ref name } if name == "made-up"
        ));
        assert!(matches!(
            HistoryStoreFactory::new()
                .create("made-up", &HistoryStoreConfig::new("made-up"))
                .err()
                .expect("made-up is not registered"),
            MemoriaError::UnsupportedProvider { family: ProviderFamily::HistoryStore, .. }
        ));
    }

    #[test]
    fn lookup_ignores_case() {
        let llm = LlmFactory::new().create("OpenAI", &LlmConfig::new("k")).unwrap();
        assert_eq!(llm.provider_name(), "openai");
        let history = HistoryStoreFactory::new()
            .create("MEMORY", &HistoryStoreConfig::new("memory"))
            .unwrap();
        assert_eq!(history.provider_name(), "memory");
    }

    #[test]
    fn file_backed_memory_history_reports_its_registered_name() {
        let config =
            HistoryStoreConfig::new("memory").with("historyDbPath", "/tmp/memoria-history.db");
        let history = HistoryStoreFactory::new().create("memory", &config).unwrap();
        assert_eq!(history.provider_name(), "memory");
    }

    #[test]
    fn register_adds_a_variant() {
        let mut factory = HistoryStoreFactory::new();
        factory.register("scratch", |_| Ok(Arc::new(InMemoryHistoryStore::new())));
        assert!(factory.providers().contains(&"scratch".to_string()));
        assert!(factory.create("Scratch", &HistoryStoreConfig::new("scratch")).is_ok());
    }
}
