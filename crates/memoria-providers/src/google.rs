// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Generative Language API (Gemini).

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

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GOOGLE_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const GOOGLE_CHAT_MODEL: &str = "gemini-1.5-flash";

const TIMEOUT: Duration = Duration::from_secs(120);

fn api_client(api_key: &str) -> Result<reqwest::Client, MemoriaError> {
    http::client(&[("x-goog-api-key", api_key)], TIMEOUT)
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct GoogleEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GoogleEmbedder {
    pub fn new(config: &EmbedderConfig) -> Result<Self, MemoriaError> {
        Ok(Self {
            client: api_client(&config.api_key)?,
            base_url: config.url.clone().unwrap_or_else(|| GOOGLE_BASE_URL.to_string()),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| GOOGLE_EMBEDDING_MODEL.to_string()),
        })
    }

    fn model_url(&self, method: &str) -> String {
        http::join(&self.base_url, &format!("models/{}:{method}", self.model))
    }

    fn content(&self, text: &str) -> Value {
        json!({
            "model": format!("models/{}", self.model),
            "content": {"parts": [{"text": text}]},
        })
    }
}

impl Provider for GoogleEmbedder {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Embedder
    }
}

#[async_trait]
impl Embedder for GoogleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoriaError> {
        let response: EmbedResponse = http::post_json(
            &self.client,
            &self.model_url("embedContent"),
            &self.content(text),
            "google",
        )
        .await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoriaError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let requests: Vec<Value> = texts.iter().map(|t| self.content(t)).collect();
        let response: BatchEmbedResponse = http::post_json(
            &self.client,
            &self.model_url("batchEmbedContents"),
            &json!({"requests": requests}),
            "google",
        )
        .await?;
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone)]
pub struct GoogleChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GoogleChat {
    pub fn new(config: &LlmConfig) -> Result<Self, MemoriaError> {
        Ok(Self {
            client: api_client(&config.api_key)?,
            base_url: config.base_url.clone().unwrap_or_else(|| GOOGLE_BASE_URL.to_string()),
            model: config.model.clone().unwrap_or_else(|| GOOGLE_CHAT_MODEL.to_string()),
        })
    }

    fn body(
        messages: &[Message],
        response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Value {
        let system: Vec<String> = messages
            .iter()
            .filter(|m| m.role == "system")
            .map(Message::text)
            .collect();
        let contents: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                json!({"role": role, "parts": [{"text": m.text()}]})
            })
            .collect();

        let mut body = json!({"contents": contents});
        if !system.is_empty() {
            body["systemInstruction"] = json!({"parts": [{"text": system.join("\n")}]});
        }
        if response_format.is_some_and(ResponseFormat::wants_json) {
            body["generationConfig"] = json!({"responseMimeType": "application/json"});
        }
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            let declarations: Vec<Value> = tools
                .iter()
                .map(|t| {
                    let f = &t["function"];
                    json!({
                        "name": f["name"],
                        "description": f["description"],
                        "parameters": f["parameters"],
                    })
                })
                .collect();
            body["tools"] = json!([{"functionDeclarations": declarations}]);
        }
        body
    }

    async fn generate(&self, body: Value) -> Result<LlmResponse, MemoriaError> {
        let url = http::join(&self.base_url, &format!("models/{}:generateContent", self.model));
        let response: GenerateResponse = http::post_json(&self.client, &url, &body, "google").await?;
        let parts = response
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts)
            .ok_or_else(|| MemoriaError::provider("google returned no candidates"))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for part in parts {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall {
                    name: call.name,
                    arguments: call.args.to_string(),
                });
            }
        }
        Ok(LlmResponse {
            content,
            role: "assistant".to_string(),
            tool_calls,
        })
    }
}

impl Provider for GoogleChat {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Llm
    }
}

#[async_trait]
impl Llm for GoogleChat {
    async fn generate_response(
        &self,
        messages: &[Message],
        response_format: Option<&ResponseFormat>,
        tools: Option<&[Value]>,
    ) -> Result<LlmOutput, MemoriaError> {
        let response = self
            .generate(Self::body(messages, response_format, tools))
            .await?;
        debug!(model = %self.model, "gemini completion received");
        Ok(LlmOutput::from_response(response))
    }

    async fn generate_chat(&self, messages: &[Message]) -> Result<LlmResponse, MemoriaError> {
        self.generate(Self::body(messages, None, None)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_messages_become_system_instruction() {
        let body = GoogleChat::body(
            &[Message::system("be brief"), Message::user("hi"), Message::new("assistant", "yo")],
            Some(&ResponseFormat::json_object()),
            None,
        );
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }
}
