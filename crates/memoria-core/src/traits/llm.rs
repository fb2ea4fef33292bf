// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completion capability.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::MemoriaError;
use crate::traits::provider::Provider;
use crate::types::{LlmOutput, LlmResponse, Message, ResponseFormat};

/// Chat-completion client used by the memory pipeline.
#[async_trait]
pub trait Llm: Provider {
    /// Generates a reply, optionally constrained to a response format or
    /// allowed to call the given tools.
    async fn generate_response(
        &self,
        messages: &[Message],
        response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Result<LlmOutput, MemoriaError>;

    /// Plain chat turn.
    async fn generate_chat(&self, messages: &[Message]) -> Result<LlmResponse, MemoriaError>;
}
