// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading and resolution.

use memoria_config::diagnostic::{ConfigError, suggest_key};
use memoria_config::model::MemoryConfigInput;
use memoria_config::{load_and_resolve_str, load_partial_from_str, resolve, resolve_or_error};
use memoria_core::MemoriaError;
use proptest::prelude::*;
use serde_json::json;

const VALID_TOML: &str = r#"
version = "v1.1"
disableHistory = true

[embedder]
provider = "openai"

[embedder.config]
apiKey = "sk-embed"
model = "text-embedding-3-large"

[vectorStore]
provider = "qdrant"

[vectorStore.config]
collectionName = "notes"
dimension = 3072
url = "http://localhost:6333"

[llm]
provider = "anthropic"

[llm.config]
apiKey = "sk-ant"
"#;

#[test]
fn toml_resolves_with_defaults_filled() {
    let config = load_and_resolve_str(VALID_TOML).expect("valid config");
    assert_eq!(config.version, "v1.1");
    assert!(config.disable_history);
    assert_eq!(
        config.embedder.config.model.as_deref(),
        Some("text-embedding-3-large")
    );
    assert_eq!(config.vector_store.config.collection_name, "notes");
    assert_eq!(config.vector_store.config.dimension, Some(3072));
    assert_eq!(
        config.vector_store.config.get_str("url"),
        Some("http://localhost:6333")
    );
    assert_eq!(config.llm.provider, "anthropic");
    assert_eq!(config.llm.config.model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(config.agent_history_name, "memory-history");
}

#[test]
fn unknown_top_level_key_suggests_correction() {
    let toml = r#"
disableHistroy = true
"#;
    let errors = load_and_resolve_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "disableHistroy" && s == "disableHistory"
    )));
}

#[test]
fn unknown_embedder_key_is_rejected() {
    let toml = r#"
[embedder.config]
apiKye = "x"
"#;
    let errors = load_and_resolve_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { suggestion: Some(s), .. } if s == "apiKey"
    )));
}

#[test]
fn unknown_vector_store_keys_pass_through() {
    let toml = r#"
[embedder.config]
apiKey = "sk-embed"

[vectorStore.config]
onDisk = true

[vectorStore.config.config]
hnswM = 16

[llm.config]
apiKey = "sk-llm"
"#;
    let config = load_and_resolve_str(toml).expect("passthrough keys are allowed");
    assert_eq!(config.vector_store.config.extra["onDisk"], json!(true));
    assert_eq!(config.vector_store.config.config["hnswM"], json!(16));
    assert_eq!(config.vector_store.config.collection_name, "memories");
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
disableHistory = "yes"
"#;
    let errors = load_and_resolve_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| matches!(e, ConfigError::InvalidType { .. })));
}

#[test]
fn missing_api_keys_are_reported_by_path() {
    let errors = load_and_resolve_str("").unwrap_err();
    let keys: Vec<_> = errors.iter().filter_map(|e| e.key()).collect();
    assert_eq!(keys, vec!["embedder.config.apiKey", "llm.config.apiKey"]);
}

#[test]
fn resolve_or_error_collapses_to_validation() {
    let err = resolve_or_error(&MemoryConfigInput::default()).unwrap_err();
    assert!(matches!(err, MemoriaError::Validation(ref m) if m.contains("embedder.config.apiKey")));
}

#[test]
fn suggest_key_is_public() {
    assert_eq!(
        suggest_key("historyStor", &["historyStore", "graphStore"]),
        Some("historyStore".to_string())
    );
}

#[test]
fn empty_toml_is_an_empty_partial() {
    assert_eq!(load_partial_from_str("").unwrap(), MemoryConfigInput::default());
}

fn arb_input() -> impl Strategy<Value = MemoryConfigInput> {
    (
        prop_oneof![Just("openai"), Just("ollama"), Just("")],
        prop_oneof![Just("sk-1"), Just("")],
        prop_oneof![Just("memory"), Just("qdrant"), Just("")],
        proptest::option::of("[a-z]{0,8}"),
        proptest::option::of(prop_oneof![Just(json!(null)), (1u64..4096).prop_map(|d| json!(d))]),
        prop_oneof![Just("openai"), Just("lmstudio")],
        proptest::option::of(any::<bool>()),
        proptest::option::of(prop_oneof![Just(json!({})), Just(json!({"k": 1})), Just(json!(null))]),
    )
        .prop_map(
            |(embedder, key, vector, collection, dimension, llm, disable, nested)| {
                let mut vs = json!({"url": "http://q:6333"});
                if let Some(c) = collection {
                    vs["collectionName"] = json!(c);
                }
                if let Some(d) = dimension {
                    vs["dimension"] = d;
                }
                if let Some(n) = nested {
                    vs["config"] = n;
                }
                let mut value = json!({
                    "embedder": {"provider": embedder, "config": {"apiKey": key}},
                    "vectorStore": {"provider": vector, "config": vs},
                    "llm": {"provider": llm, "config": {"apiKey": key, "extraOption": 7}},
                });
                if let Some(d) = disable {
                    value["disableHistory"] = json!(d);
                }
                serde_json::from_value(value).expect("generated input deserializes")
            },
        )
}

proptest! {
    #[test]
    fn resolving_a_resolved_config_is_a_no_op(input in arb_input()) {
        let first = resolve(&input);
        prop_assume!(first.is_ok());
        let first = first.unwrap();
        let second = resolve(&first.to_input()).expect("resolved config re-resolves");
        prop_assert_eq!(first, second);
    }
}
