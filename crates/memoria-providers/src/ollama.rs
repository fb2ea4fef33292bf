// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama native API: `/api/embeddings` and `/api/chat`. No API key.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use memoria_config::{EmbedderConfig, LlmConfig};
use memoria_core::{
    Embedder, Llm, LlmOutput, LlmResponse, MemoriaError, Message, Provider, ProviderFamily,
    ResponseFormat, ToolCall,
};

use crate::http;

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text:latest";
pub const OLLAMA_CHAT_MODEL: &str = "llama3.1:8b";

/// Local models can be slow to load on first call.
const TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbedderConfig) -> Result<Self, MemoriaError> {
        Ok(Self {
            client: http::client(&[], TIMEOUT)?,
            base_url: config.url.clone().unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| OLLAMA_EMBEDDING_MODEL.to_string()),
        })
    }
}

impl Provider for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Embedder
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoriaError> {
        let body = json!({"model": self.model, "prompt": text});
        let url = http::join(&self.base_url, "api/embeddings");
        let response: EmbeddingResponse = http::post_json(&self.client, &url, &body, "ollama").await?;
        Ok(response.embedding)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaChat {
    /// `baseUrl` or the nested `config.url`, else the local daemon.
    pub fn new(config: &LlmConfig) -> Result<Self, MemoriaError> {
        let base_url = config
            .base_url
            .clone()
            .or_else(|| config.nested_str("url").map(str::to_string))
            .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
        Ok(Self {
            client: http::client(&[], TIMEOUT)?,
            base_url,
            model: config.model.clone().unwrap_or_else(|| OLLAMA_CHAT_MODEL.to_string()),
        })
    }

    async fn chat(
        &self,
        messages: &[Message],
        response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Result<LlmResponse, MemoriaError> {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.text()}))
            .collect();
        let mut body = json!({"model": self.model, "messages": messages, "stream": false});
        if response_format.is_some_and(ResponseFormat::wants_json) {
            body["format"] = json!("json");
        }
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            body["tools"] = Value::Array(tools.to_vec());
        }

        let url = http::join(&self.base_url, "api/chat");
        let response: ChatResponse = http::post_json(&self.client, &url, &body, "ollama").await?;
        let message = response.message;
        Ok(LlmResponse {
            content: message.content,
            role: message.role.unwrap_or_else(|| "assistant".to_string()),
            tool_calls: message
                .tool_calls
                .into_iter()
                .map(|c| ToolCall {
                    name: c.function.name,
                    arguments: c.function.arguments.to_string(),
                })
                .collect(),
        })
    }
}

impl Provider for OllamaChat {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Llm
    }
}

#[async_trait]
impl Llm for OllamaChat {
    async fn generate_response(
        &self,
        messages: &[Message],
        response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Result<LlmOutput, MemoriaError> {
        let response = self.chat(messages, response_format, tools).await?;
        debug!(model = %self.model, "ollama completion received");
        Ok(LlmOutput::from_response(response))
    }

    async fn generate_chat(&self, messages: &[Message]) -> Result<LlmResponse, MemoriaError> {
        self.chat(messages, None, None).await
    }
}
