// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API client.
//!
//! System messages are lifted out of the message list into the top-level
//! `system` field; OpenAI-style function tools are translated to
//! `{name, description, input_schema}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use memoria_config::LlmConfig;
use memoria_core::{
    Llm, LlmOutput, LlmResponse, MemoriaError, Message, Provider, ProviderFamily, ResponseFormat,
    ToolCall,
};

use crate::http;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone)]
pub struct AnthropicChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl AnthropicChat {
    pub fn new(config: &LlmConfig) -> Result<Self, MemoriaError> {
        let client = http::client(
            &[
                ("x-api-key", config.api_key.as_str()),
                ("anthropic-version", ANTHROPIC_VERSION),
            ],
            Duration::from_secs(300),
        )?;
        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
            model: config.model.clone().unwrap_or_else(|| ANTHROPIC_MODEL.to_string()),
        })
    }

    fn body(&self, messages: &[Message], tools: Option<&[Value]>) -> Value {
        let system: Vec<String> = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(Message::text)
            .collect();
        let turns: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| json!({"role": m.role, "content": m.text()}))
            .collect();

        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": turns,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n"));
        }
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    let f = &t["function"];
                    json!({
                        "name": f["name"],
                        "description": f["description"],
                        "input_schema": f["parameters"],
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }
        body
    }

    async fn send(&self, body: Value) -> Result<LlmResponse, MemoriaError> {
        let url = http::join(&self.base_url, "messages");
        let response: MessageResponse =
            http::post_json(&self.client, &url, &body, "anthropic").await?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in response.content {
            match block {
                ContentBlock::Text { text } => content.push_str(&text),
                ContentBlock::ToolUse { name, input } => tool_calls.push(ToolCall {
                    name,
                    arguments: input.to_string(),
                }),
                ContentBlock::Other => {}
            }
        }
        Ok(LlmResponse {
            content,
            role: response.role.unwrap_or_else(|| "assistant".to_string()),
            tool_calls,
        })
    }
}

impl Provider for AnthropicChat {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Llm
    }
}

#[async_trait]
impl Llm for AnthropicChat {
    /// Anthropic has no response-format switch; JSON is requested through
    /// the prompt by the caller.
    async fn generate_response(
        &self,
        messages: &[Message],
        _response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Result<LlmOutput, MemoriaError> {
        let response = self.send(self.body(messages, tools)).await?;
        debug!(model = %self.model, tool_calls = response.tool_calls.len(), "anthropic completion received");
        Ok(LlmOutput::from_response(response))
    }

    async fn generate_chat(&self, messages: &[Message]) -> Result<LlmResponse, MemoriaError> {
        self.send(self.body(messages, None)).await
    }
}
