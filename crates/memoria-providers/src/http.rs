// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP plumbing for the provider clients.

use std::time::Duration;

use memoria_core::MemoriaError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Error body shared by the OpenAI, Anthropic and Google APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Builds a client sending `headers` on every request.
pub(crate) fn client(
    headers: &[(&'static str, &str)],
    timeout: Duration,
) -> Result<reqwest::Client, MemoriaError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|e| {
            MemoriaError::Validation(format!("invalid {name} header value: {e}"))
        })?;
        map.insert(HeaderName::from_static(name), value);
    }
    map.insert("content-type", HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(map)
        .timeout(timeout)
        .build()
        .map_err(|e| MemoriaError::Provider {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// POSTs `body` as JSON and decodes the JSON reply.
///
/// Network failures are `Transport`; non-2xx statuses are `Provider` with the
/// API's own error message when the body carries one.
pub(crate) async fn post_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    body: &Value,
    provider: &str,
) -> Result<T, MemoriaError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(MemoriaError::transport)?;

    let status = response.status();
    debug!(status = %status, provider, "response received");
    let text = response.text().await.map_err(MemoriaError::transport)?;

    if !status.is_success() {
        let message = match serde_json::from_str::<ApiErrorResponse>(&text) {
            Ok(api) if !api.error.message.is_empty() => {
                format!("{provider} API error ({status}): {}", api.error.message)
            }
            _ => format!("{provider} API returned {status}: {text}"),
        };
        return Err(MemoriaError::provider(message));
    }

    serde_json::from_str(&text).map_err(|e| MemoriaError::Provider {
        message: format!("failed to parse {provider} response: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
