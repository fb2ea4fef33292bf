// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use memoria_core::MemoriaError;
use reqwest::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

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

/// Sends the request, failing with `Provider` on a non-success status.
pub(crate) async fn send(request: RequestBuilder, what: &str) -> Result<reqwest::Response, MemoriaError> {
    let response = request.send().await.map_err(MemoriaError::transport)?;
    let status = response.status();
    debug!(status = %status, what, "response received");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MemoriaError::provider(format!("{what} returned {status}: {body}")))
}

pub(crate) async fn json<T: DeserializeOwned>(
    request: RequestBuilder,
    what: &str,
) -> Result<T, MemoriaError> {
    send(request, what)
        .await?
        .json::<T>()
        .await
        .map_err(MemoriaError::transport)
}
