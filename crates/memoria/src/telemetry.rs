// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for applications embedding Memoria.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber. `RUST_LOG` wins over `log_level`, which
/// applies to the `memoria*` crates only.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(log_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init()
        .is_ok()
}

fn default_filter(log_level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "memoria={log_level},memoria_config={log_level},memoria_vector={log_level},\
         memoria_history={log_level},memoria_providers={log_level},memoria_storage={log_level},warn"
    ))
}
