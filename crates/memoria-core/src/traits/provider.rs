// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by all capability implementations.

use crate::types::ProviderFamily;

/// Identity of a provider instance.
pub trait Provider: Send + Sync + 'static {
    /// Registered provider name (e.g. `"qdrant"`, `"openai"`).
    fn provider_name(&self) -> &str;

    /// Capability family this instance serves.
    fn family(&self) -> ProviderFamily;
}
