// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in defaults, expressed in the same shape as caller input so the
//! resolver can merge one over the other.

use std::sync::LazyLock;

use serde_json::{Value, json};

use crate::model::{
    ConfigMap, EmbedderConfigInput, EmbedderInput, GraphStoreInput, MemoryConfigInput, Neo4jInput,
    SectionInput,
};

pub const DEFAULT_VERSION: &str = "v1.1";
pub const DEFAULT_EMBEDDER_PROVIDER: &str = "openai";
pub const DEFAULT_EMBEDDER_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_VECTOR_PROVIDER: &str = "memory";
pub const DEFAULT_COLLECTION: &str = "memories";
pub const DEFAULT_DIMENSION: usize = 1536;
pub const DEFAULT_LLM_PROVIDER: &str = "openai";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_HISTORY_PROVIDER: &str = "memory";
pub const DEFAULT_GRAPH_PROVIDER: &str = "neo4j";
pub const DEFAULT_GRAPH_URL: &str = "neo4j://localhost:7687";
pub const DEFAULT_AGENT_HISTORY_NAME: &str = "memory-history";

static DEFAULTS: LazyLock<MemoryConfigInput> = LazyLock::new(build_defaults);

/// The immutable default configuration.
pub fn defaults() -> &'static MemoryConfigInput {
    &DEFAULTS
}

fn object(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        _ => ConfigMap::new(),
    }
}

fn build_defaults() -> MemoryConfigInput {
    MemoryConfigInput {
        version: Some(DEFAULT_VERSION.into()),
        embedder: Some(EmbedderInput {
            provider: Some(DEFAULT_EMBEDDER_PROVIDER.into()),
            config: Some(EmbedderConfigInput {
                api_key: Some(String::new()),
                model: Some(DEFAULT_EMBEDDER_MODEL.into()),
                account_id: None,
                url: None,
            }),
        }),
        vector_store: Some(SectionInput::new(
            DEFAULT_VECTOR_PROVIDER,
            object(json!({
                "collectionName": DEFAULT_COLLECTION,
                "dimension": DEFAULT_DIMENSION,
            })),
        )),
        llm: Some(SectionInput::new(
            DEFAULT_LLM_PROVIDER,
            object(json!({
                "apiKey": "",
                "model": DEFAULT_LLM_MODEL,
            })),
        )),
        history_store: Some(SectionInput::new(DEFAULT_HISTORY_PROVIDER, ConfigMap::new())),
        graph_store: Some(GraphStoreInput {
            provider: Some(DEFAULT_GRAPH_PROVIDER.into()),
            config: Some(Neo4jInput {
                url: Some(DEFAULT_GRAPH_URL.into()),
                username: Some("neo4j".into()),
                password: Some("password".into()),
            }),
            llm: Some(SectionInput::new(
                DEFAULT_LLM_PROVIDER,
                object(json!({"model": DEFAULT_LLM_MODEL})),
            )),
            custom_prompt: None,
        }),
        disable_history: Some(false),
        enable_graph: Some(false),
        agent_history_name: Some(DEFAULT_AGENT_HISTORY_NAME.into()),
        custom_prompt: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_documented_values() {
        let d = defaults();
        assert_eq!(d.version.as_deref(), Some("v1.1"));
        let vs = d.vector_store.as_ref().unwrap().config.as_ref().unwrap();
        assert_eq!(vs["collectionName"], json!("memories"));
        assert_eq!(vs["dimension"], json!(1536));
        assert_eq!(
            d.graph_store.as_ref().unwrap().config.as_ref().unwrap().url.as_deref(),
            Some("neo4j://localhost:7687")
        );
    }

    #[test]
    fn defaults_are_shared() {
        assert!(std::ptr::eq(defaults(), defaults()));
    }
}
