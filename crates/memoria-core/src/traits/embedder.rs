// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding capability.

use async_trait::async_trait;

use crate::error::MemoriaError;
use crate::traits::provider::Provider;

/// Converts text into vectors for similarity search.
#[async_trait]
pub trait Embedder: Provider {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoriaError>;

    /// Embeds several texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, MemoriaError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
