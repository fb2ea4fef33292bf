// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector store backends for Memoria.
//!
//! - [`SqliteVectorStore`]: the reference engine (exact cosine scan over
//!   SQLite), shared per collection through [`CollectionNamespace`].
//! - [`VectorizeStore`], [`QdrantStore`], [`SupabaseStore`], [`RedisStore`]:
//!   adapters over remote services.
//!
//! All of them implement [`memoria_core::VectorStore`] with the same
//! dimension, filter and upsert semantics.

pub mod cloudflare;
pub mod namespace;
pub mod qdrant;
pub mod redis;
pub mod reference;
mod rest;
pub mod similarity;
pub mod supabase;

pub use cloudflare::VectorizeStore;
pub use namespace::CollectionNamespace;
pub use qdrant::QdrantStore;
pub use redis::RedisStore;
pub use reference::SqliteVectorStore;
pub use supabase::SupabaseStore;
