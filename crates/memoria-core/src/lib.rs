// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Memoria memory backends.
//!
//! This crate provides the capability traits (embedder, LLM, vector store,
//! history store), the shared error taxonomy, and the types exchanged across
//! trait boundaries. Every provider crate implements traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BoxError, MemoriaError};
pub use types::{
    HistoryEntry, HistoryRecord, LlmOutput, LlmResponse, Message, Payload, ProviderFamily,
    ResponseFormat, SearchFilters, ToolCall, VectorStoreResult,
};

pub use traits::{Embedder, HistoryStore, Llm, Provider, VectorStore};
