// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types exchanged across the capability traits.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Arbitrary key/value metadata attached to a stored vector.
pub type Payload = Map<String, Value>;

/// Capability family a provider belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    Embedder,
    Llm,
    VectorStore,
    HistoryStore,
}

/// Equality filters applied to vector payloads.
///
/// A payload matches iff every filter key is present in the payload with an
/// equal value. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchFilters(pub Map<String, Value>);

impl SearchFilters {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns true if `payload` satisfies every constraint.
    pub fn matches(&self, payload: &Payload) -> bool {
        self.0
            .iter()
            .all(|(key, expected)| payload.get(key) == Some(expected))
    }
}

/// Applies an optional filter; `None` matches everything.
pub fn matches_filters(filters: Option<&SearchFilters>, payload: &Payload) -> bool {
    filters.is_none_or(|f| f.matches(payload))
}

/// A record returned by vector store lookups.
///
/// `score` is only populated by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreResult {
    pub id: String,
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl VectorStoreResult {
    /// Result without a similarity score (get/list).
    pub fn unscored(id: impl Into<String>, payload: Payload) -> Self {
        Self {
            id: id.into(),
            payload,
            score: None,
        }
    }
}

/// A mutation to append to the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub memory_id: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub action: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(with = "int_bool")]
    pub is_deleted: bool,
}

impl HistoryEntry {
    /// Entry with only the required fields set.
    pub fn new(memory_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            memory_id: memory_id.into(),
            previous_value: None,
            new_value: None,
            action: action.into(),
            created_at: None,
            updated_at: None,
            is_deleted: false,
        }
    }

    pub fn previous_value(mut self, value: impl Into<String>) -> Self {
        self.previous_value = Some(value.into());
        self
    }

    pub fn new_value(mut self, value: impl Into<String>) -> Self {
        self.new_value = Some(value.into());
        self
    }

    pub fn timestamps(mut self, created_at: impl Into<String>, updated_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self.updated_at = Some(updated_at.into());
        self
    }

    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }
}

/// A persisted history row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub memory_id: String,
    pub previous_value: Option<String>,
    pub new_value: Option<String>,
    pub action: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(with = "int_bool")]
    pub is_deleted: bool,
}

impl HistoryRecord {
    /// Materialise an entry under an assigned row id.
    pub fn from_entry(id: i64, entry: HistoryEntry) -> Self {
        Self {
            id,
            memory_id: entry.memory_id,
            previous_value: entry.previous_value,
            new_value: entry.new_value,
            action: entry.action,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            is_deleted: entry.is_deleted,
        }
    }
}

/// `is_deleted` is persisted as `0|1`; accept either integers or booleans.
mod int_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrBool {
        Int(i64),
        Bool(bool),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match IntOrBool::deserialize(deserializer)? {
            IntOrBool::Int(i) => i != 0,
            IntOrBool::Bool(b) => b,
        })
    }
}

/// Image reference inside a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Message content: plain text or an image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Image {
        #[serde(rename = "type")]
        kind: String,
        image_url: ImageUrl,
    },
}

/// A chat message sent to an LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system", text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", text)
    }

    pub fn image(role: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Image {
                kind: "image_url".to_string(),
                image_url: ImageUrl { url: url.into() },
            },
        }
    }

    /// Content as plain text; non-text content is rendered as JSON.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// Requested response shape for an LLM call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<Value>,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
            json_schema: None,
        }
    }

    pub fn json_schema(schema: Value) -> Self {
        Self {
            kind: "json_schema".to_string(),
            json_schema: Some(schema),
        }
    }

    pub fn wants_json(&self) -> bool {
        self.kind != "text"
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: String,
}

/// A full assistant reply.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// Output of `Llm::generate_response`: text, or a structured reply when the
/// model called tools.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmOutput {
    Text(String),
    Response(LlmResponse),
}

impl LlmOutput {
    /// Builds the output from an assistant reply, keeping the structured form
    /// only when tool calls are present.
    pub fn from_response(response: LlmResponse) -> Self {
        if response.tool_calls.is_empty() {
            LlmOutput::Text(response.content)
        } else {
            LlmOutput::Response(response)
        }
    }

    /// Text content regardless of variant.
    pub fn content(&self) -> &str {
        match self {
            LlmOutput::Text(text) => text,
            LlmOutput::Response(response) => &response.content,
        }
    }
}
