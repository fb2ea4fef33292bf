// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedder for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use memoria_core::{Embedder, MemoriaError, Provider, ProviderFamily};

/// Embeds text by hashing its words into `dimension` buckets, then
/// normalising. Identical text always yields the identical vector; texts that
/// share words are closer than texts that don't.
///
/// Fixed vectors can be pinned per text with [`MockEmbedder::pin`].
pub struct MockEmbedder {
    dimension: usize,
    pinned: Mutex<HashMap<String, Vec<f32>>>,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            pinned: Mutex::new(HashMap::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns `vector` for exactly `text` from now on.
    pub fn pin(&self, text: impl Into<String>, vector: Vec<f32>) {
        if let Ok(mut pinned) = self.pinned.lock() {
            pinned.insert(text.into(), vector);
        }
    }

    fn hashed(&self, text: &str) -> Vec<f32> {
        let mut out = vec![0.0_f32; self.dimension.max(1)];
        for word in text.split_whitespace() {
            // FNV-1a
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in word.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            let bucket = (hash % out.len() as u64) as usize;
            out[bucket] += 1.0;
        }
        let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            out.iter_mut().for_each(|x| *x /= norm);
        }
        out.truncate(self.dimension);
        out
    }
}

impl Provider for MockEmbedder {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn family(&self) -> ProviderFamily {
        ProviderFamily::Embedder
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MemoriaError> {
        let pinned = self
            .pinned
            .lock()
            .map_err(|_| MemoriaError::Internal("mock embedder lock poisoned".into()))?
            .get(text)
            .cloned();
        Ok(pinned.unwrap_or_else(|| self.hashed(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_same_vector() {
        let embedder = MockEmbedder::new(8);
        let a = embedder.embed("likes pizza").await.unwrap();
        let b = embedder.embed("likes pizza").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[tokio::test]
    async fn pinned_vectors_win() {
        let embedder = MockEmbedder::new(2);
        embedder.pin("north", vec![0.0, 1.0]);
        assert_eq!(embedder.embed("north").await.unwrap(), vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let embedder = MockEmbedder::new(4);
        embedder.pin("a", vec![1.0, 0.0, 0.0, 0.0]);
        embedder.pin("b", vec![0.0, 1.0, 0.0, 0.0]);
        let out = embedder
            .embed_batch(&["b".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(out[0], vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(out[1], vec![1.0, 0.0, 0.0, 0.0]);
    }
}
