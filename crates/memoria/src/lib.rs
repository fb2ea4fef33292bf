// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-agnostic memory backends for AI agents.
//!
//! Resolve a partial configuration, then build the embedder, LLM, vector
//! store and history store it names:
//!
//! ```no_run
//! # async fn run() -> Result<(), memoria::MemoriaError> {
//! use memoria::{MemoryBackends, MemoryConfigInput};
//!
//! let input: MemoryConfigInput = serde_json::from_value(serde_json::json!({
//!     "embedder": {"provider": "openai", "config": {"apiKey": "sk-..."}},
//!     "llm": {"provider": "openai", "config": {"apiKey": "sk-..."}},
//! }))?;
//! let backends = MemoryBackends::build(&input)?;
//! backends.vector_store.initialize().await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod registry;
pub mod telemetry;

pub use backends::{Factories, MemoryBackends};
pub use registry::{
    EmbedderFactory, HistoryStoreFactory, LlmFactory, Registry, VectorStoreFactory,
};
pub use telemetry::init_tracing;

pub use memoria_config::{MemoryConfig, MemoryConfigInput};
pub use memoria_core::{
    Embedder, HistoryEntry, HistoryRecord, HistoryStore, Llm, MemoriaError, Payload,
    ProviderFamily, SearchFilters, VectorStore, VectorStoreResult,
};
