// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model: the partial input a caller supplies and the fully
//! resolved record built from it.
//!
//! Fixed-shape sections use `#[serde(deny_unknown_fields)]`. The vector store
//! and LLM `config` sections are open bags whose unknown keys pass through.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended key/value bag.
pub type ConfigMap = Map<String, Value>;

// --- Partial input ---

/// Caller-supplied configuration. Every field is optional and merged over
/// the built-in defaults by [`crate::resolver::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MemoryConfigInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedder: Option<EmbedderInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_store: Option<SectionInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<SectionInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_store: Option<SectionInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_store: Option<GraphStoreInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_history: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_graph: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_history_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

/// Embedder section of the input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedderInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EmbedderConfigInput>,
}

/// Embedder options. Each field falls back to its default when empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmbedderConfigInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Cloudflare account owning the Workers AI endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Base URL for self-hosted embedders (ollama).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A `{provider, config}` section whose config is an open bag
/// (vector store, LLM, history store).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SectionInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigMap>,
}

impl SectionInput {
    pub fn new(provider: impl Into<String>, config: ConfigMap) -> Self {
        Self {
            provider: Some(provider.into()),
            config: Some(config),
        }
    }
}

/// Graph store section of the input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GraphStoreInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Neo4jInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<SectionInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

/// Graph database connection settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Neo4jInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// --- Resolved configuration ---

/// Fully populated, validated configuration. Read-only after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfig {
    pub version: String,
    pub embedder: EmbedderSection,
    pub vector_store: VectorStoreSection,
    pub llm: LlmSection,
    pub history_store: Option<HistoryStoreConfig>,
    pub graph_store: Option<GraphStoreConfig>,
    pub disable_history: bool,
    pub enable_graph: bool,
    pub agent_history_name: String,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedderSection {
    pub provider: String,
    pub config: EmbedderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedderConfig {
    pub api_key: String,
    pub model: Option<String>,
    pub account_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreSection {
    pub provider: String,
    pub config: VectorStoreConfig,
}

/// Vector store options. Keys other than the known ones are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorStoreConfig {
    pub collection_name: String,
    pub dimension: Option<usize>,
    /// Provider-specific options, replaced wholesale rather than merged.
    pub config: ConfigMap,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl VectorStoreConfig {
    /// Minimal config for a collection, mostly useful in tests.
    pub fn new(collection_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection_name: collection_name.into(),
            dimension: Some(dimension),
            config: ConfigMap::new(),
            extra: ConfigMap::new(),
        }
    }

    /// Adds a passthrough option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Non-empty string passthrough option.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        non_empty_str(&self.extra, key)
    }

    /// Configured dimension or `default`.
    pub fn dimension_or(&self, default: usize) -> usize {
        self.dimension.unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    pub provider: String,
    pub config: LlmConfig,
}

/// LLM options. Keys other than the known ones are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub config: ConfigMap,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
            config: ConfigMap::new(),
            extra: ConfigMap::new(),
        }
    }

    /// Non-empty string option from the nested provider-specific `config`.
    pub fn nested_str(&self, key: &str) -> Option<&str> {
        non_empty_str(&self.config, key)
    }
}

/// History store selection. `config` is an open bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStoreConfig {
    pub provider: String,
    pub config: ConfigMap,
}

impl HistoryStoreConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            config: ConfigMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        non_empty_str(&self.config, key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStoreConfig {
    pub provider: String,
    pub config: Neo4jConfig,
    pub llm: Option<GraphLlmConfig>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLlmConfig {
    pub provider: String,
    pub config: ConfigMap,
}

fn non_empty_str<'a>(map: &'a ConfigMap, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

impl MemoryConfig {
    /// Converts the resolved record back into an input, so that resolving it
    /// again yields the same configuration.
    pub fn to_input(&self) -> MemoryConfigInput {
        MemoryConfigInput {
            version: Some(self.version.clone()),
            embedder: Some(EmbedderInput {
                provider: Some(self.embedder.provider.clone()),
                config: Some(EmbedderConfigInput {
                    api_key: Some(self.embedder.config.api_key.clone()),
                    model: self.embedder.config.model.clone(),
                    account_id: self.embedder.config.account_id.clone(),
                    url: self.embedder.config.url.clone(),
                }),
            }),
            vector_store: Some(SectionInput::new(
                self.vector_store.provider.clone(),
                self.vector_store.config.to_map(),
            )),
            llm: Some(SectionInput::new(
                self.llm.provider.clone(),
                self.llm.config.to_map(),
            )),
            history_store: self
                .history_store
                .as_ref()
                .map(|h| SectionInput::new(h.provider.clone(), h.config.clone())),
            graph_store: self.graph_store.as_ref().map(|g| GraphStoreInput {
                provider: Some(g.provider.clone()),
                config: Some(Neo4jInput {
                    url: Some(g.config.url.clone()),
                    username: Some(g.config.username.clone()),
                    password: Some(g.config.password.clone()),
                }),
                llm: g
                    .llm
                    .as_ref()
                    .map(|l| SectionInput::new(l.provider.clone(), l.config.clone())),
                custom_prompt: g.custom_prompt.clone(),
            }),
            disable_history: Some(self.disable_history),
            enable_graph: Some(self.enable_graph),
            agent_history_name: Some(self.agent_history_name.clone()),
            custom_prompt: self.custom_prompt.clone(),
        }
    }
}

impl VectorStoreConfig {
    /// Flattens back into the bag form used by the input. Absent optional
    /// keys are written as `null` so they stay absent on a second merge.
    pub fn to_map(&self) -> ConfigMap {
        let mut map = self.extra.clone();
        map.insert(
            "collectionName".into(),
            Value::String(self.collection_name.clone()),
        );
        map.insert(
            "dimension".into(),
            self.dimension.map(Value::from).unwrap_or(Value::Null),
        );
        map.insert("config".into(), Value::Object(self.config.clone()));
        map
    }
}

impl LlmConfig {
    /// Flattens back into the bag form used by the input.
    pub fn to_map(&self) -> ConfigMap {
        let mut map = self.extra.clone();
        map.insert("apiKey".into(), Value::String(self.api_key.clone()));
        map.insert(
            "model".into(),
            self.model.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map.insert(
            "baseUrl".into(),
            self.base_url.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map.insert("config".into(), Value::Object(self.config.clone()));
        map
    }
}
