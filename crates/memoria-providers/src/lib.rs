// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin embedder and LLM adapters over provider HTTP APIs.
//!
//! Each adapter is built from the resolved configuration section, keeps a
//! pooled `reqwest::Client`, and maps failures onto
//! [`memoria_core::MemoriaError`]. There are no retries here.

pub mod anthropic;
pub mod google;
mod http;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicChat;
pub use google::{GoogleChat, GoogleEmbedder};
pub use ollama::{OllamaChat, OllamaEmbedder};
pub use openai::{OpenAiChat, OpenAiEmbedder};
