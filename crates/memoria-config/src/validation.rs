// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-merge validation. Turns a merged input into a [`MemoryConfig`],
//! collecting every problem instead of stopping at the first.

use serde_json::Value;

use crate::diagnostic::ConfigError;
use crate::model::{
    ConfigMap, EmbedderConfig, EmbedderSection, GraphLlmConfig, GraphStoreConfig,
    GraphStoreInput, HistoryStoreConfig, LlmConfig, LlmSection, MemoryConfig, MemoryConfigInput,
    Neo4jConfig, SectionInput, VectorStoreConfig, VectorStoreSection,
};

/// Embedder providers that run locally and need no API key.
const LOCAL_EMBEDDERS: &[&str] = &["ollama"];

/// LLM providers that run locally and need no API key.
const LOCAL_LLMS: &[&str] = &["ollama", "lmstudio", "lmstudio_structured"];

/// Keys a vector store provider cannot start without.
pub fn required_vector_keys(provider: &str) -> &'static [&'static str] {
    match provider.to_ascii_lowercase().as_str() {
        "cloudflare" => &["accountId", "apiToken"],
        "qdrant" => &["url"],
        "redis" => &["redisUrl"],
        "supabase" => &["supabaseUrl", "supabaseKey"],
        _ => &[],
    }
}

fn is_local(provider: &str, local: &[&str]) -> bool {
    let lower = provider.to_ascii_lowercase();
    local.contains(&lower.as_str())
}

/// Validate a merged input and build the resolved configuration.
pub fn finalize(merged: &MemoryConfigInput) -> Result<MemoryConfig, Vec<ConfigError>> {
    let mut errors = Vec::new();

    let embedder = finalize_embedder(merged, &mut errors);
    let vector_store = finalize_vector_store(merged.vector_store.as_ref(), &mut errors);
    let llm = finalize_llm(merged.llm.as_ref(), &mut errors);
    let history_store = merged
        .history_store
        .as_ref()
        .map(|h| finalize_history(h, &mut errors));
    let graph_store = merged
        .graph_store
        .as_ref()
        .map(|g| finalize_graph(g, &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(MemoryConfig {
        version: merged.version.clone().unwrap_or_default(),
        embedder,
        vector_store,
        llm,
        history_store,
        graph_store,
        disable_history: merged.disable_history.unwrap_or(false),
        enable_graph: merged.enable_graph.unwrap_or(false),
        agent_history_name: merged.agent_history_name.clone().unwrap_or_default(),
        custom_prompt: merged.custom_prompt.clone(),
    })
}

fn require_provider(provider: Option<&String>, key: &str, errors: &mut Vec<ConfigError>) -> String {
    match provider {
        Some(p) if !p.is_empty() => p.clone(),
        _ => {
            errors.push(ConfigError::missing(key));
            String::new()
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

fn finalize_embedder(merged: &MemoryConfigInput, errors: &mut Vec<ConfigError>) -> EmbedderSection {
    let section = merged.embedder.clone().unwrap_or_default();
    let config = section.config.unwrap_or_default();
    let provider = require_provider(section.provider.as_ref(), "embedder.provider", errors);

    let api_key = config.api_key.clone().unwrap_or_default();
    if api_key.is_empty() && !provider.is_empty() && !is_local(&provider, LOCAL_EMBEDDERS) {
        errors.push(ConfigError::missing("embedder.config.apiKey"));
    }

    let account_id = non_empty(config.account_id.as_ref());
    if provider.eq_ignore_ascii_case("cloudflare") && account_id.is_none() {
        errors.push(ConfigError::missing("embedder.config.accountId"));
    }

    EmbedderSection {
        provider,
        config: EmbedderConfig {
            api_key,
            model: non_empty(config.model.as_ref()),
            account_id,
            url: non_empty(config.url.as_ref()),
        },
    }
}

/// Takes the nested `config` object out of a bag.
fn take_nested(bag: &mut ConfigMap, path: &str, errors: &mut Vec<ConfigError>) -> ConfigMap {
    match bag.remove("config") {
        None | Some(Value::Null) => ConfigMap::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            errors.push(ConfigError::invalid_type(path, "object", &other));
            ConfigMap::new()
        }
    }
}

/// Optional string key of a bag. Empty strings and `null` count as absent.
fn take_opt_str(
    bag: &mut ConfigMap,
    key: &str,
    path: &str,
    errors: &mut Vec<ConfigError>,
) -> Option<String> {
    match bag.remove(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            errors.push(ConfigError::invalid_type(path, "string", &other));
            None
        }
    }
}

fn finalize_vector_store(
    section: Option<&SectionInput>,
    errors: &mut Vec<ConfigError>,
) -> VectorStoreSection {
    let section = section.cloned().unwrap_or_default();
    let provider = require_provider(section.provider.as_ref(), "vectorStore.provider", errors);
    let mut bag = section.config.unwrap_or_default();

    let collection_name = match bag.remove("collectionName") {
        None | Some(Value::Null) => {
            errors.push(ConfigError::missing("vectorStore.config.collectionName"));
            String::new()
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(ConfigError::validation(
                "vectorStore.config.collectionName",
                "collection name must not be empty",
            ));
            s
        }
        Some(Value::String(s)) => s,
        Some(other) => {
            errors.push(ConfigError::invalid_type(
                "vectorStore.config.collectionName",
                "string",
                &other,
            ));
            String::new()
        }
    };

    let dimension = match bag.remove("dimension") {
        None | Some(Value::Null) => None,
        Some(value) => match value.as_u64().filter(|d| *d > 0) {
            Some(d) => Some(d as usize),
            None => {
                errors.push(ConfigError::invalid_type(
                    "vectorStore.config.dimension",
                    "positive integer",
                    &value,
                ));
                None
            }
        },
    };

    let config = take_nested(&mut bag, "vectorStore.config.config", errors);

    for key in required_vector_keys(&provider) {
        let present = bag
            .get(*key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        if !present {
            errors.push(ConfigError::missing(format!("vectorStore.config.{key}")));
        }
    }

    VectorStoreSection {
        provider,
        config: VectorStoreConfig {
            collection_name,
            dimension,
            config,
            extra: bag,
        },
    }
}

fn finalize_llm(section: Option<&SectionInput>, errors: &mut Vec<ConfigError>) -> LlmSection {
    let section = section.cloned().unwrap_or_default();
    let provider = require_provider(section.provider.as_ref(), "llm.provider", errors);
    let mut bag = section.config.unwrap_or_default();

    let api_key = take_opt_str(&mut bag, "apiKey", "llm.config.apiKey", errors).unwrap_or_default();
    if api_key.is_empty() && !provider.is_empty() && !is_local(&provider, LOCAL_LLMS) {
        errors.push(ConfigError::missing("llm.config.apiKey"));
    }

    let model = take_opt_str(&mut bag, "model", "llm.config.model", errors);
    let base_url = take_opt_str(&mut bag, "baseUrl", "llm.config.baseUrl", errors);
    let config = take_nested(&mut bag, "llm.config.config", errors);

    LlmSection {
        provider,
        config: LlmConfig {
            api_key,
            model,
            base_url,
            config,
            extra: bag,
        },
    }
}

fn finalize_history(section: &SectionInput, errors: &mut Vec<ConfigError>) -> HistoryStoreConfig {
    HistoryStoreConfig {
        provider: require_provider(section.provider.as_ref(), "historyStore.provider", errors),
        config: section.config.clone().unwrap_or_default(),
    }
}

fn finalize_graph(section: &GraphStoreInput, errors: &mut Vec<ConfigError>) -> GraphStoreConfig {
    let provider = require_provider(section.provider.as_ref(), "graphStore.provider", errors);
    let neo4j = section.config.clone().unwrap_or_default();

    let mut required = |value: Option<String>, key: &str| match non_empty(value.as_ref()) {
        Some(v) => v,
        None => {
            errors.push(ConfigError::missing(format!("graphStore.config.{key}")));
            String::new()
        }
    };
    let config = Neo4jConfig {
        url: required(neo4j.url, "url"),
        username: required(neo4j.username, "username"),
        password: required(neo4j.password, "password"),
    };

    let llm = section.llm.as_ref().map(|l| GraphLlmConfig {
        provider: require_provider(l.provider.as_ref(), "graphStore.llm.provider", errors),
        config: l.config.clone().unwrap_or_default(),
    });

    GraphStoreConfig {
        provider,
        config,
        llm,
        custom_prompt: section.custom_prompt.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use serde_json::json;

    fn resolve_json(value: Value) -> Result<MemoryConfig, Vec<ConfigError>> {
        resolve(&serde_json::from_value(value).unwrap())
    }

    fn keys(errors: &[ConfigError]) -> Vec<String> {
        errors
            .iter()
            .filter_map(|e| e.key().map(str::to_string))
            .collect()
    }

    fn valid_base() -> Value {
        json!({
            "embedder": {"provider": "openai", "config": {"apiKey": "sk-e"}},
            "llm": {"provider": "openai", "config": {"apiKey": "sk-l"}}
        })
    }

    #[test]
    fn minimal_valid_config_resolves() {
        let config = resolve_json(valid_base()).unwrap();
        assert_eq!(config.vector_store.provider, "memory");
        assert_eq!(config.vector_store.config.collection_name, "memories");
        assert_eq!(config.vector_store.config.dimension, Some(1536));
        assert_eq!(config.llm.config.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.history_store.unwrap().provider, "memory");
        assert_eq!(config.agent_history_name, "memory-history");
    }

    #[test]
    fn all_errors_collected() {
        let errors = resolve_json(json!({
            "vectorStore": {"provider": "qdrant", "config": {"dimension": 0}}
        }))
        .unwrap_err();
        let keys = keys(&errors);
        assert!(keys.contains(&"embedder.config.apiKey".to_string()));
        assert!(keys.contains(&"llm.config.apiKey".to_string()));
        assert!(keys.contains(&"vectorStore.config.dimension".to_string()));
        assert!(keys.contains(&"vectorStore.config.url".to_string()));
    }

    #[test]
    fn local_providers_need_no_api_key() {
        let config = resolve_json(json!({
            "embedder": {"provider": "ollama"},
            "llm": {"provider": "LMStudio"}
        }))
        .unwrap();
        assert_eq!(config.embedder.config.api_key, "");
        assert_eq!(config.llm.provider, "LMStudio");
    }

    #[test]
    fn cloudflare_embedder_needs_account_id() {
        let mut value = valid_base();
        value["embedder"]["provider"] = json!("cloudflare");
        let errors = resolve_json(value).unwrap_err();
        assert_eq!(keys(&errors), vec!["embedder.config.accountId".to_string()]);
    }

    #[test]
    fn supabase_vector_keys_required() {
        let mut value = valid_base();
        value["vectorStore"] = json!({"provider": "supabase", "config": {"supabaseUrl": "http://s"}});
        let errors = resolve_json(value).unwrap_err();
        assert_eq!(keys(&errors), vec!["vectorStore.config.supabaseKey".to_string()]);
    }

    #[test]
    fn empty_collection_name_rejected() {
        let mut value = valid_base();
        value["vectorStore"] = json!({"config": {"collectionName": ""}});
        let errors = resolve_json(value).unwrap_err();
        assert!(matches!(&errors[0], ConfigError::Validation { key, .. } if key == "vectorStore.config.collectionName"));
    }

    #[test]
    fn non_object_nested_config_rejected() {
        let mut value = valid_base();
        value["llm"]["config"]["config"] = json!("nope");
        let errors = resolve_json(value).unwrap_err();
        assert_eq!(keys(&errors), vec!["llm.config.config".to_string()]);
    }

    #[test]
    fn passthrough_keys_kept_in_extra() {
        let mut value = valid_base();
        value["vectorStore"] = json!({
            "provider": "qdrant",
            "config": {"url": "http://q", "onDisk": true, "config": {"hnsw": 16}}
        });
        let config = resolve_json(value).unwrap();
        let vs = config.vector_store.config;
        assert_eq!(vs.get_str("url"), Some("http://q"));
        assert_eq!(vs.extra["onDisk"], json!(true));
        assert_eq!(vs.config["hnsw"], json!(16));
        assert!(!vs.extra.contains_key("collectionName"));
    }

    #[test]
    fn null_dimension_resolves_to_none() {
        let mut value = valid_base();
        value["vectorStore"] = json!({"config": {"dimension": null}});
        let config = resolve_json(value).unwrap();
        assert_eq!(config.vector_store.config.dimension, None);
    }

    #[test]
    fn graph_credentials_required_when_replaced() {
        let mut value = valid_base();
        value["graphStore"] = json!({"config": {"url": "neo4j://g"}});
        let errors = resolve_json(value).unwrap_err();
        let keys = keys(&errors);
        assert!(keys.contains(&"graphStore.config.username".to_string()));
        assert!(keys.contains(&"graphStore.config.password".to_string()));
    }

    #[test]
    fn required_vector_keys_case_insensitive() {
        assert_eq!(required_vector_keys("Qdrant"), &["url"]);
        assert!(required_vector_keys("memory").is_empty());
    }
}
