// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merges caller input over the defaults.
//!
//! The merge is deliberately asymmetric:
//!
//! - Scalars take the user value when truthy (non-empty string, `true`),
//!   otherwise the default.
//! - `vectorStore.config` and `llm.config` are open bags: default keys first,
//!   then every user key on top, even empty ones. Their nested `config` key is
//!   never merged key-by-key. It is the user's value, or `{}`.
//! - `historyStore` and `graphStore` are spread shallowly, so a user
//!   `graphStore.config` replaces the default one entirely.

use serde_json::Value;
use tracing::debug;

use crate::defaults::defaults;
use crate::diagnostic::ConfigError;
use crate::model::{
    ConfigMap, EmbedderConfigInput, EmbedderInput, GraphStoreInput, MemoryConfig,
    MemoryConfigInput, SectionInput,
};
use crate::validation;

/// Merge `input` over the built-in defaults and validate the result.
pub fn resolve(input: &MemoryConfigInput) -> Result<MemoryConfig, Vec<ConfigError>> {
    resolve_with_defaults(input, defaults())
}

/// Like [`resolve`], against an explicit defaults record.
pub fn resolve_with_defaults(
    input: &MemoryConfigInput,
    defaults: &MemoryConfigInput,
) -> Result<MemoryConfig, Vec<ConfigError>> {
    let merged = merge(input, defaults);
    let resolved = validation::finalize(&merged)?;
    debug!(
        embedder = %resolved.embedder.provider,
        vector_store = %resolved.vector_store.provider,
        llm = %resolved.llm.provider,
        history_disabled = resolved.disable_history,
        "configuration resolved"
    );
    Ok(resolved)
}

/// Merge without validating. The result has every default filled in.
pub fn merge(user: &MemoryConfigInput, defaults: &MemoryConfigInput) -> MemoryConfigInput {
    MemoryConfigInput {
        version: truthy_str(&user.version, &defaults.version),
        embedder: Some(merge_embedder(user.embedder.as_ref(), defaults.embedder.as_ref())),
        vector_store: Some(merge_bag_section(
            user.vector_store.as_ref(),
            defaults.vector_store.as_ref(),
        )),
        llm: Some(merge_bag_section(user.llm.as_ref(), defaults.llm.as_ref())),
        history_store: spread_section(user.history_store.as_ref(), defaults.history_store.as_ref()),
        graph_store: spread_graph(user.graph_store.as_ref(), defaults.graph_store.as_ref()),
        disable_history: Some(truthy_bool(user.disable_history, defaults.disable_history)),
        enable_graph: Some(truthy_bool(user.enable_graph, defaults.enable_graph)),
        agent_history_name: truthy_str(&user.agent_history_name, &defaults.agent_history_name),
        custom_prompt: user.custom_prompt.clone(),
    }
}

fn truthy_str(user: &Option<String>, default: &Option<String>) -> Option<String> {
    match user {
        Some(v) if !v.is_empty() => Some(v.clone()),
        _ => default.clone(),
    }
}

fn truthy_bool(user: Option<bool>, default: Option<bool>) -> bool {
    user.unwrap_or(false) || default.unwrap_or(false)
}

fn merge_embedder(user: Option<&EmbedderInput>, default: Option<&EmbedderInput>) -> EmbedderInput {
    let empty = EmbedderConfigInput::default();
    let uc = user.and_then(|u| u.config.as_ref()).unwrap_or(&empty);
    let dc = default.and_then(|d| d.config.as_ref()).unwrap_or(&empty);

    EmbedderInput {
        provider: truthy_str(
            &user.and_then(|u| u.provider.clone()),
            &default.and_then(|d| d.provider.clone()),
        ),
        config: Some(EmbedderConfigInput {
            api_key: truthy_str(&uc.api_key, &dc.api_key),
            model: truthy_str(&uc.model, &dc.model),
            account_id: truthy_str(&uc.account_id, &dc.account_id),
            url: truthy_str(&uc.url, &dc.url),
        }),
    }
}

fn merge_bag_section(user: Option<&SectionInput>, default: Option<&SectionInput>) -> SectionInput {
    let provider = truthy_str(
        &user.and_then(|u| u.provider.clone()),
        &default.and_then(|d| d.provider.clone()),
    );

    let mut bag = default
        .and_then(|d| d.config.clone())
        .unwrap_or_default();
    // The nested map never inherits from the defaults.
    bag.remove("config");

    let user_bag = user.and_then(|u| u.config.as_ref());
    if let Some(user_bag) = user_bag {
        for (key, value) in user_bag {
            bag.insert(key.clone(), value.clone());
        }
    }

    let nested = match bag.remove("config") {
        Some(Value::Null) | None => Value::Object(ConfigMap::new()),
        Some(other) => other,
    };
    bag.insert("config".into(), nested);

    SectionInput {
        provider,
        config: Some(bag),
    }
}

fn spread_section(
    user: Option<&SectionInput>,
    default: Option<&SectionInput>,
) -> Option<SectionInput> {
    match (user, default) {
        (None, None) => None,
        (Some(u), None) => Some(u.clone()),
        (None, Some(d)) => Some(d.clone()),
        (Some(u), Some(d)) => Some(SectionInput {
            provider: u.provider.clone().or_else(|| d.provider.clone()),
            config: u.config.clone().or_else(|| d.config.clone()),
        }),
    }
}

fn spread_graph(
    user: Option<&GraphStoreInput>,
    default: Option<&GraphStoreInput>,
) -> Option<GraphStoreInput> {
    match (user, default) {
        (None, None) => None,
        (Some(u), None) => Some(u.clone()),
        (None, Some(d)) => Some(d.clone()),
        (Some(u), Some(d)) => Some(GraphStoreInput {
            provider: u.provider.clone().or_else(|| d.provider.clone()),
            config: u.config.clone().or_else(|| d.config.clone()),
            llm: u.llm.clone().or_else(|| d.llm.clone()),
            custom_prompt: u.custom_prompt.clone().or_else(|| d.custom_prompt.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Neo4jInput;
    use serde_json::json;

    fn input(value: Value) -> MemoryConfigInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_string_scalar_falls_back_to_default() {
        let merged = merge(
            &input(json!({"version": "", "embedder": {"provider": ""}})),
            defaults(),
        );
        assert_eq!(merged.version.as_deref(), Some("v1.1"));
        assert_eq!(
            merged.embedder.unwrap().provider.as_deref(),
            Some("openai")
        );
    }

    #[test]
    fn false_flag_does_not_override_true_default() {
        let mut d = defaults().clone();
        d.disable_history = Some(true);
        let merged = merge(&input(json!({"disableHistory": false})), &d);
        assert_eq!(merged.disable_history, Some(true));
    }

    #[test]
    fn bag_keeps_default_keys_and_passes_unknown_keys() {
        let merged = merge(
            &input(json!({"vectorStore": {"provider": "qdrant", "config": {"url": "http://q", "onDisk": true}}})),
            defaults(),
        );
        let bag = merged.vector_store.unwrap().config.unwrap();
        assert_eq!(bag["collectionName"], json!("memories"));
        assert_eq!(bag["dimension"], json!(1536));
        assert_eq!(bag["onDisk"], json!(true));
        assert_eq!(bag["config"], json!({}));
    }

    #[test]
    fn bag_user_keys_win_even_when_empty() {
        let merged = merge(
            &input(json!({"vectorStore": {"config": {"collectionName": ""}}})),
            defaults(),
        );
        let bag = merged.vector_store.unwrap().config.unwrap();
        assert_eq!(bag["collectionName"], json!(""));
    }

    #[test]
    fn nested_config_replaced_wholesale() {
        let mut d = defaults().clone();
        d.vector_store
            .as_mut()
            .unwrap()
            .config
            .as_mut()
            .unwrap()
            .insert("config".into(), json!({"a": 1, "b": 2}));

        let merged = merge(
            &input(json!({"vectorStore": {"config": {"config": {"c": 3}}}})),
            &d,
        );
        let bag = merged.vector_store.unwrap().config.unwrap();
        assert_eq!(bag["config"], json!({"c": 3}));

        let merged = merge(&MemoryConfigInput::default(), &d);
        let bag = merged.vector_store.unwrap().config.unwrap();
        assert_eq!(bag["config"], json!({}));
    }

    #[test]
    fn graph_config_spread_shallowly() {
        let user = MemoryConfigInput {
            graph_store: Some(GraphStoreInput {
                config: Some(Neo4jInput {
                    url: Some("neo4j://graph:7687".into()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(&user, defaults());
        let graph = merged.graph_store.unwrap();
        assert_eq!(graph.provider.as_deref(), Some("neo4j"));
        let config = graph.config.unwrap();
        assert_eq!(config.url.as_deref(), Some("neo4j://graph:7687"));
        // Not merged with the default credentials.
        assert_eq!(config.username, None);
    }

    #[test]
    fn history_store_provider_overrides_default() {
        let merged = merge(
            &input(json!({"historyStore": {"provider": "supabase"}})),
            defaults(),
        );
        let history = merged.history_store.unwrap();
        assert_eq!(history.provider.as_deref(), Some("supabase"));
        assert_eq!(history.config, Some(ConfigMap::new()));
    }

    #[test]
    fn custom_prompt_taken_as_is() {
        let merged = merge(&input(json!({"customPrompt": ""})), defaults());
        assert_eq!(merged.custom_prompt.as_deref(), Some(""));
    }
}
