// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector encoding and similarity ranking shared by the backends.

use std::cmp::Ordering;

use memoria_core::types::{Payload, SearchFilters, VectorStoreResult, matches_filters};

/// Encode an f32 vector as a little-endian BLOB.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode a little-endian BLOB. Trailing bytes that do not form a full f32
/// are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity. NaN when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return f32::NAN;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Descending by score with NaN (and missing scores) last.
fn by_score_desc(a: Option<f32>, b: Option<f32>) -> Ordering {
    let a = a.filter(|s| !s.is_nan());
    let b = b.filter(|s| !s.is_nan());
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by score, best first. Ties keep their input order.
pub fn rank(results: &mut [VectorStoreResult]) {
    results.sort_by(|a, b| by_score_desc(a.score, b.score));
}

/// Exact k-nearest-neighbour search over in-process candidates.
pub fn top_k<I>(
    query: &[f32],
    candidates: I,
    limit: usize,
    filters: Option<&SearchFilters>,
) -> Vec<VectorStoreResult>
where
    I: IntoIterator<Item = (String, Vec<f32>, Payload)>,
{
    let mut scored: Vec<VectorStoreResult> = candidates
        .into_iter()
        .filter(|(_, _, payload)| matches_filters(filters, payload))
        .map(|(id, vector, payload)| VectorStoreResult {
            score: Some(cosine_similarity(query, &vector)),
            id,
            payload,
        })
        .collect();
    rank(&mut scored);
    scored.truncate(limit);
    scored
}
