// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all adapters implement.

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all toolforge adapters.
///
/// Providers, embedders, stores and runtimes all expose identity and a
/// health check through this trait so the CLI can report on them uniformly.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, ForgeError>;

    /// Releases any held resources.
    async fn shutdown(&self) -> Result<(), ForgeError>;
}
