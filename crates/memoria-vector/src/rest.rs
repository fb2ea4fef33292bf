// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small helpers shared by the HTTP-backed stores.

use std::time::Duration;

use memoria_core::MemoriaError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Client with the given static headers and a request timeout.
pub(crate) fn client(headers: &[(&'static str, &str)]) -> Result<reqwest::Client, MemoriaError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|e| {
            MemoriaError::Validation(format!("invalid {name} header value: {e}"))
        })?;
        map.insert(HeaderName::from_static(name), value);
    }

    reqwest::Client::builder()
        .default_headers(map)
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(MemoriaError::transport)
}

/// Sends the request. Network failures become `Transport`, any status is returned.
pub(crate) async fn send_raw(request: RequestBuilder) -> Result<Response, MemoriaError> {
    request.send().await.map_err(MemoriaError::transport)
}

/// Fails with `Provider` on a non-success status.
pub(crate) async fn check(response: Response, what: &str) -> Result<Response, MemoriaError> {
    let status = response.status();
    debug!(status = %status, what, "response received");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MemoriaError::provider(format!("{what} returned {status}: {body}")))
}

/// Sends, checks the status and decodes a JSON body.
pub(crate) async fn json<T: DeserializeOwned>(
    request: RequestBuilder,
    what: &str,
) -> Result<T, MemoriaError> {
    let response = check(send_raw(request).await?, what).await?;
    response.json::<T>().await.map_err(MemoriaError::transport)
}

/// Sends and checks the status, discarding the body.
pub(crate) async fn execute(request: RequestBuilder, what: &str) -> Result<(), MemoriaError> {
    check(send_raw(request).await?, what).await.map(|_| ())
}

pub(crate) fn is_not_found(response: &Response) -> bool {
    response.status() == StatusCode::NOT_FOUND
}

/// Renders an id from a JSON value that may be a string or a number.
pub(crate) fn id_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
