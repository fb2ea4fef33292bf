// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration resolution for the Memoria memory backends.
//!
//! A caller supplies a partial [`MemoryConfigInput`] (in code, JSON, TOML
//! files or `MEMORIA_*` environment variables). [`resolve`] merges it over the
//! built-in defaults and validates the result, reporting every problem as a
//! [`ConfigError`] with the offending key path.
//!
//! ```no_run
//! use memoria_config::load_and_resolve;
//!
//! let config = load_and_resolve().expect("config errors");
//! println!("vector store: {}", config.vector_store.provider);
//! ```

use memoria_core::MemoriaError;

pub mod defaults;
pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod resolver;
pub mod validation;

pub use diagnostic::{ConfigError, into_memoria_error, render_errors};
pub use loader::{load_partial, load_partial_from_path, load_partial_from_str};
pub use model::{
    ConfigMap, EmbedderConfig, EmbedderSection, GraphStoreConfig, HistoryStoreConfig, LlmConfig,
    LlmSection, MemoryConfig, MemoryConfigInput, VectorStoreConfig, VectorStoreSection,
};
pub use resolver::{merge, resolve, resolve_with_defaults};

/// Load the partial configuration from files and environment, then resolve it.
pub fn load_and_resolve() -> Result<MemoryConfig, Vec<ConfigError>> {
    match loader::load_partial() {
        Ok(partial) => resolve(&partial),
        Err(err) => {
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Parse a TOML string and resolve it.
pub fn load_and_resolve_str(toml_content: &str) -> Result<MemoryConfig, Vec<ConfigError>> {
    match loader::load_partial_from_str(toml_content) {
        Ok(partial) => resolve(&partial),
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Resolve a partial config, collapsing diagnostics into one [`MemoriaError`].
pub fn resolve_or_error(input: &MemoryConfigInput) -> Result<MemoryConfig, MemoriaError> {
    resolve(input).map_err(|errors| into_memoria_error(&errors))
}

fn collect_toml_sources() -> Vec<(String, String)> {
    loader::config_paths()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            let display = if path.is_relative() {
                std::env::current_dir()
                    .map(|d| d.join(&path).display().to_string())
                    .unwrap_or_else(|_| path.display().to_string())
            } else {
                path.display().to_string()
            };
            Some((display, content))
        })
        .collect()
}
