// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clients for OpenAI-compatible `/embeddings` and `/chat/completions` APIs.
//!
//! One embedder type serves `openai`, `together` and Cloudflare Workers AI;
//! one chat type serves `openai`, `openai_structured`, `groq`, `lmstudio`
//! and `lmstudio_structured`. They differ only in base URL, default model
//! and how `response_format` is sent.

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

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const LMSTUDIO_BASE_URL: &str = "http://localhost:1234";
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

pub const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const TOGETHER_EMBEDDING_MODEL: &str = "togethercomputer/m2-bert-80M-8k-retrieval";
pub const CLOUDFLARE_EMBEDDING_MODEL: &str = "@cf/baai/bge-large-en-v1.5";
pub const OPENAI_CHAT_MODEL: &str = "gpt-4o-mini";
pub const GROQ_CHAT_MODEL: &str = "llama3-70b-8192";
pub const LMSTUDIO_CHAT_MODEL: &str = "llama3.1:8b";

const TIMEOUT: Duration = Duration::from_secs(120);

// --- Embeddings ---

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Embedder for any OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    name: &'static str,
}

impl OpenAiEmbedder {
    fn build(
        name: &'static str,
        config: &EmbedderConfig,
        base_url: String,
        default_model: &str,
    ) -> Result<Self, MemoriaError> {
        let bearer = format!("Bearer {}", config.api_key);
        let client = http::client(&[("authorization", bearer.as_str())], TIMEOUT)?;
        Ok(Self {
            client,
            base_url,
            model: config.model.clone().unwrap_or_else(|| default_model.to_string()),
            name,
        })
    }

    /// `openai`. `url` overrides the base URL.
    pub fn openai(config: &EmbedderConfig) -> Result<Self, MemoriaError> {
        let base = config.url.clone().unwrap_or_else(|| OPENAI_BASE_URL.to_string());
        Self::build("openai", config, base, OPENAI_EMBEDDING_MODEL)
    }

    /// `together`.
    pub fn together(config: &EmbedderConfig) -> Result<Self, MemoriaError> {
        let base = config.url.clone().unwrap_or_else(|| TOGETHER_BASE_URL.to_string());
        Self::build("together", config, base, TOGETHER_EMBEDDING_MODEL)
    }

    /// `cloudflare` Workers AI. Needs `accountId` unless `url` is given.
    pub fn cloudflare(config: &EmbedderConfig) -> Result<Self, MemoriaError> {
        let base = match (&config.url, &config.account_id) {
            (Some(url), _) => url.clone(),
            (None, Some(account)) => format!("{CLOUDFLARE_API_BASE}/accounts/{account}/ai/v1"),
            (None, None) => {
                return Err(MemoriaError::Validation(
                    "embedder.config.accountId is required for cloudflare".into(),
                ));
            }
        };
        Self::build("cloudflare", config, base, CLOUDFLARE_EMBEDDING_MODEL)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, input: Value) -> Result<Vec<Vec<f32>>, MemoriaError> {
        let body = json!({"model": self.model, "input": input});
        let url = http::join(&self.base_url, "embeddings");
        let mut response: EmbeddingResponse =
            http::post_json(&self.client, &url, &body, self.name).await?;
        // Items may come back out of order; `index` restores input order.
        response.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Provider for OpenAiEmbedder {
    fn provider_name(&self) -> &str {
        self.name
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Embedder
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoriaError> {
        self.request(json!(text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MemoriaError::provider(format!("{} returned no embedding", self.name)))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoriaError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request(json!(texts)).await?;
        if vectors.len() != texts.len() {
            return Err(MemoriaError::provider(format!(
                "{} returned {} embeddings for {} inputs",
                self.name,
                vectors.len(),
                texts.len()
            )));
        }
        debug!(provider = self.name, count = texts.len(), "batch embedded");
        Ok(vectors)
    }
}

// --- Chat completions ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiToolCall {
    function: ApiFunction,
}

#[derive(Debug, Deserialize)]
struct ApiFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl From<ChatMessage> for LlmResponse {
    fn from(message: ChatMessage) -> Self {
        LlmResponse {
            content: message.content.unwrap_or_default(),
            role: message.role.unwrap_or_else(|| "assistant".to_string()),
            tool_calls: message
                .tool_calls
                .into_iter()
                .map(|c| ToolCall {
                    name: c.function.name,
                    arguments: c.function.arguments,
                })
                .collect(),
        }
    }
}

/// Chat client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    name: &'static str,
    structured: bool,
}

impl OpenAiChat {
    fn build(
        name: &'static str,
        config: &LlmConfig,
        base_url: String,
        default_model: &str,
        structured: bool,
    ) -> Result<Self, MemoriaError> {
        let headers: Vec<(&'static str, String)> = if config.api_key.is_empty() {
            Vec::new()
        } else {
            vec![("authorization", format!("Bearer {}", config.api_key))]
        };
        let header_refs: Vec<(&'static str, &str)> =
            headers.iter().map(|(k, v)| (*k, v.as_str())).collect();
        Ok(Self {
            client: http::client(&header_refs, TIMEOUT)?,
            base_url,
            model: config.model.clone().unwrap_or_else(|| default_model.to_string()),
            name,
            structured,
        })
    }

    fn base(config: &LlmConfig, default: &str) -> String {
        config.base_url.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn openai(config: &LlmConfig) -> Result<Self, MemoriaError> {
        Self::build("openai", config, Self::base(config, OPENAI_BASE_URL), OPENAI_CHAT_MODEL, false)
    }

    pub fn openai_structured(config: &LlmConfig) -> Result<Self, MemoriaError> {
        let base = Self::base(config, OPENAI_BASE_URL);
        Self::build("openai_structured", config, base, OPENAI_CHAT_MODEL, true)
    }

    pub fn groq(config: &LlmConfig) -> Result<Self, MemoriaError> {
        Self::build("groq", config, Self::base(config, GROQ_BASE_URL), GROQ_CHAT_MODEL, false)
    }

    pub fn lmstudio(config: &LlmConfig) -> Result<Self, MemoriaError> {
        let base = Self::base(config, LMSTUDIO_BASE_URL);
        Self::build("lmstudio", config, base, LMSTUDIO_CHAT_MODEL, false)
    }

    /// Reads its base URL from the nested `config.url`.
    pub fn lmstudio_structured(config: &LlmConfig) -> Result<Self, MemoriaError> {
        let base = config
            .nested_str("url")
            .map(str::to_string)
            .or_else(|| config.base_url.clone())
            .unwrap_or_else(|| LMSTUDIO_BASE_URL.to_string());
        Self::build("lmstudio_structured", config, base, LMSTUDIO_CHAT_MODEL, true)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        // LM Studio serves the API under /v1 on a bare host.
        if self.base_url.trim_end_matches('/').ends_with("/v1") {
            http::join(&self.base_url, "chat/completions")
        } else {
            http::join(&self.base_url, "v1/chat/completions")
        }
    }

    fn body(
        &self,
        messages: &[Message],
        response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Result<Value, MemoriaError> {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.text()}))
            .collect();
        let mut body = json!({"model": self.model, "messages": messages});

        match (tools, response_format) {
            (Some(tools), _) if !tools.is_empty() => {
                let tools: Vec<Value> = if self.structured {
                    tools.iter().map(strict_tool).collect()
                } else {
                    tools.to_vec()
                };
                body["tools"] = Value::Array(tools);
                body["tool_choice"] = json!("auto");
                if !self.structured {
                    if let Some(format) = response_format {
                        body["response_format"] = serde_json::to_value(format)?;
                    }
                }
            }
            (_, Some(format)) if self.structured => {
                body["response_format"] = json!({
                    "type": "json_schema",
                    "json_schema": format.json_schema.clone().unwrap_or(Value::Null),
                });
            }
            (_, Some(format)) => {
                body["response_format"] = serde_json::to_value(format)?;
            }
            _ => {}
        }
        Ok(body)
    }

    async fn complete(&self, body: Value) -> Result<LlmResponse, MemoriaError> {
        let response: ChatResponse =
            http::post_json(&self.client, &self.url(), &body, self.name).await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MemoriaError::provider(format!("{} returned no choices", self.name)))?
            .message;
        Ok(message.into())
    }
}

/// Marks a function tool as strict for structured-output endpoints.
fn strict_tool(tool: &Value) -> Value {
    let function = &tool["function"];
    json!({
        "type": "function",
        "function": {
            "name": function["name"],
            "description": function["description"],
            "parameters": function["parameters"],
            "strict": true,
        }
    })
}

impl Provider for OpenAiChat {
    fn provider_name(&self) -> &str {
        self.name
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Llm
    }
}

#[async_trait]
impl Llm for OpenAiChat {
    async fn generate_response(
        &self,
        messages: &[Message],
        response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Result<LlmOutput, MemoriaError> {
        let body = self.body(messages, response_format, tools)?;
        let response = self.complete(body).await?;
        debug!(provider = self.name, tool_calls = response.tool_calls.len(), "completion received");
        Ok(LlmOutput::from_response(response))
    }

    async fn generate_chat(&self, messages: &[Message]) -> Result<LlmResponse, MemoriaError> {
        let body = self.body(messages, None, None)?;
        self.complete(body).await
    }
}
