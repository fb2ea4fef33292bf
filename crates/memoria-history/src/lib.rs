// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History store backends for Memoria.
//!
//! Every backend keeps an append-only log of memory mutations keyed by
//! memory id. [`SqliteHistoryStore`] is the relational reference;
//! [`AgentHistoryStore`] hosts one such log per named agent inside an
//! [`AgentNamespace`].

pub mod agent;
pub mod memory;
mod rest;
pub mod sqlite;
pub mod supabase;

pub use agent::{AgentHistoryStore, AgentNamespace};
pub use memory::InMemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;
pub use supabase::SupabaseHistoryStore;
