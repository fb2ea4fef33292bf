// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM with pre-configured replies.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use memoria_core::{
    Llm, LlmOutput, LlmResponse, MemoriaError, Message, Provider, ProviderFamily, ResponseFormat,
};

const DEFAULT_REPLY: &str = "mock response";

/// Replies are popped from a FIFO queue. When the queue is empty the reply is
/// `"mock response"`. Every request's messages are recorded.
#[derive(Default)]
pub struct MockLlm {
    replies: Arc<Mutex<VecDeque<LlmResponse>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads plain-text replies.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = replies
            .into_iter()
            .map(|text| assistant(text.into()))
            .collect::<VecDeque<_>>();
        Self {
            replies: Arc::new(Mutex::new(queue)),
            requests: Arc::default(),
        }
    }

    /// Queues a full reply, e.g. one carrying tool calls.
    pub async fn push_response(&self, response: LlmResponse) {
        self.replies.lock().await.push_back(response);
    }

    pub async fn push_text(&self, text: impl Into<String>) {
        self.push_response(assistant(text.into())).await;
    }

    /// Messages of every request received so far.
    pub async fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().await.clone()
    }

    async fn next(&self, messages: &[Message]) -> LlmResponse {
        self.requests.lock().await.push(messages.to_vec());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| assistant(DEFAULT_REPLY.to_string()))
    }
}

fn assistant(content: String) -> LlmResponse {
    LlmResponse {
        content,
        role: "assistant".to_string(),
        tool_calls: Vec::new(),
    }
}

impl Provider for MockLlm {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Llm
    }
}

#[async_trait]
impl Llm for MockLlm {
    async fn generate_response(
        &self,
        messages: &[Message],
        _response_format: Option<&ResponseFormat>,
        _tools: Option<&[Value]>,
    ) -> Result<LlmOutput, MemoriaError> {
        Ok(LlmOutput::from_response(self.next(messages).await))
    }

    async fn generate_chat(&self, messages: &[Message]) -> Result<LlmResponse, MemoriaError> {
        Ok(self.next(messages).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoria_core::ToolCall;

    #[tokio::test]
    async fn replies_in_fifo_order_then_default() {
        let llm = MockLlm::with_replies(["first", "second"]);
        let msgs = [Message::user("hi")];
        assert_eq!(llm.generate_chat(&msgs).await.unwrap().content, "first");
        assert_eq!(llm.generate_chat(&msgs).await.unwrap().content, "second");
        assert_eq!(llm.generate_chat(&msgs).await.unwrap().content, DEFAULT_REPLY);
        assert_eq!(llm.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn tool_calls_produce_structured_output() {
        let llm = MockLlm::new();
        llm.push_response(LlmResponse {
            content: String::new(),
            role: "assistant".into(),
            tool_calls: vec![ToolCall {
                name: "add_memory".into(),
                arguments: "{}".into(),
            }],
        })
        .await;
        let out = llm
            .generate_response(&[Message::user("x")], None, None)
            .await
            .unwrap();
        assert!(matches!(out, LlmOutput::Response(_)));
    }
}
