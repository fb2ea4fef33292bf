// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite connection management for the Memoria stores.
//!
//! Every store owns one [`Database`]. All statements for that store run on
//! `tokio-rusqlite`'s single background thread, which makes the store the
//! sole writer of its file.

pub mod database;

pub use database::{Database, IN_MEMORY, map_tr_err};
