// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Memoria.
//!
//! Provides mock providers and shared contract checks so every backend is
//! exercised against the same expectations without external services.
//!
//! # Components
//!
//! - [`MockEmbedder`] - deterministic text-to-vector embedder
//! - [`MockLlm`] - LLM with a FIFO queue of canned replies
//! - [`contract`] - behavioural checks for vector and history stores

pub mod contract;
pub mod mock_embedder;
pub mod mock_llm;

pub use mock_embedder::MockEmbedder;
pub use mock_llm::MockLlm;
