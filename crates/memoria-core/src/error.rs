// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every Memoria provider and store.

use thiserror::Error;

use crate::types::ProviderFamily;

/// Boxed error used to carry an underlying failure without rewrapping it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type returned by all capability traits and factories.
#[derive(Debug, Error)]
pub enum MemoriaError {
    /// Malformed or incomplete configuration. Raised before any provider is built.
    #[error("validation error: {0}")]
    Validation(String),

    /// No implementation is registered under the requested provider name.
    #[error("unsupported {family} provider: {name}")]
    UnsupportedProvider { family: ProviderFamily, name: String },

    /// A vector's length differs from the collection dimension.
    /// The collection is left unchanged.
    #[error("{}", format_dimension_mismatch(id.as_deref(), *expected, *actual))]
    DimensionMismatch {
        id: Option<String>,
        expected: usize,
        actual: usize,
    },

    /// The operation has no meaning for this backend.
    #[error("{operation} is not applicable for {backend}")]
    NotApplicable {
        operation: &'static str,
        backend: &'static str,
    },

    /// Caller supplied arguments that violate an operation's preconditions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Local storage failures (SQLite open, query, schema).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// Network failure from an external collaborator, carried unmodified.
    ///
    /// The original error (e.g. `reqwest::Error`, `redis::RedisError`) is kept
    /// as the source so callers can downcast it.
    #[error("transport error: {source}")]
    Transport { source: BoxError },

    /// A remote API answered but rejected the request.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<BoxError>,
    },

    /// Payload or response (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemoriaError {
    /// Wrap a transport-level failure without altering it.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MemoriaError::Transport {
            source: Box::new(err),
        }
    }

    /// Wrap a local storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        MemoriaError::Storage { source: err.into() }
    }

    /// Remote API rejection with a message and no underlying error.
    pub fn provider(message: impl Into<String>) -> Self {
        MemoriaError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for errors caused by the caller rather than the backend.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            MemoriaError::Validation(_)
                | MemoriaError::UnsupportedProvider { .. }
                | MemoriaError::DimensionMismatch { .. }
                | MemoriaError::InvalidInput(_)
        )
    }
}

fn format_dimension_mismatch(id: Option<&str>, expected: usize, actual: usize) -> String {
    match id {
        Some(id) => format!(
            "vector dimension mismatch for id {id}: expected {expected}, got {actual}"
        ),
        None => format!("query dimension mismatch: expected {expected}, got {actual}"),
    }
}
