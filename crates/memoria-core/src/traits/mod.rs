// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits implemented by every provider family.
//!
//! All capabilities extend the [`Provider`] base trait and use
//! `#[async_trait]` so they can be held as `Arc<dyn ...>`.

pub mod embedder;
pub mod history_store;
pub mod llm;
pub mod provider;
pub mod vector_store;

pub use embedder::Embedder;
pub use history_store::HistoryStore;
pub use llm::Llm;
pub use provider::Provider;
pub use vector_store::{ensure_batch, ensure_dimension, VectorStore, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT};
