// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered loading of the partial configuration with figment.
//!
//! Merge order (later overrides earlier):
//! 1. `/etc/memoria/memoria.toml`
//! 2. `~/.config/memoria/memoria.toml`
//! 3. `./memoria.toml`
//! 4. `MEMORIA_*` environment variables
//!
//! The result is still partial; defaults are applied by the resolver.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MemoryConfigInput;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/memoria/memoria.toml";
pub const LOCAL_CONFIG_PATH: &str = "memoria.toml";

/// Config files in merge order. Missing files are skipped by figment.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("memoria/memoria.toml"));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG_PATH));
    paths
}

/// Load the partial configuration from the file hierarchy and environment.
pub fn load_partial() -> Result<MemoryConfigInput, figment::Error> {
    build_figment().extract()
}

/// Parse a partial configuration from a TOML string only.
pub fn load_partial_from_str(toml_content: &str) -> Result<MemoryConfigInput, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoryConfigInput::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load from one explicit file plus environment overrides.
pub fn load_partial_from_path(path: &Path) -> Result<MemoryConfigInput, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemoryConfigInput::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The figment used by [`load_partial`], before extraction.
pub fn build_figment() -> Figment {
    config_paths().into_iter().fold(
        Figment::new().merge(Serialized::defaults(MemoryConfigInput::default())),
        |figment, path| figment.merge(Toml::file(path)),
    )
    .merge(env_provider())
}

/// Environment variable name (prefix stripped) to config key path.
///
/// Explicit because key names contain underscores and camelCase:
/// `MEMORIA_EMBEDDER_API_KEY` must become `embedder.config.apiKey`.
pub fn map_env_key(key: &str) -> Option<&'static str> {
    let mapped = match key.to_ascii_lowercase().as_str() {
        "version" => "version",
        "embedder_provider" => "embedder.provider",
        "embedder_api_key" => "embedder.config.apiKey",
        "embedder_model" => "embedder.config.model",
        "embedder_account_id" => "embedder.config.accountId",
        "embedder_url" => "embedder.config.url",
        "vector_store_provider" => "vectorStore.provider",
        "vector_store_collection_name" => "vectorStore.config.collectionName",
        "vector_store_dimension" => "vectorStore.config.dimension",
        "vector_store_db_path" => "vectorStore.config.dbPath",
        "llm_provider" => "llm.provider",
        "llm_api_key" => "llm.config.apiKey",
        "llm_model" => "llm.config.model",
        "llm_base_url" => "llm.config.baseUrl",
        "history_store_provider" => "historyStore.provider",
        "disable_history" => "disableHistory",
        "enable_graph" => "enableGraph",
        "agent_history_name" => "agentHistoryName",
        "custom_prompt" => "customPrompt",
        _ => return None,
    };
    Some(mapped)
}

fn env_provider() -> Env {
    Env::prefixed("MEMORIA_")
        .filter_map(|key| map_env_key(key.as_str()).map(Into::into))
        .lowercase(false)
}
