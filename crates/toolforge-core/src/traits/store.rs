// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool store adapter trait: the persistent similarity store.

use async_trait::async_trait;

use crate::error::ForgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ScoredTool, ToolRecord};

/// Persistent, name-keyed storage for tool records with similarity lookup.
///
/// Records are keyed by [`crate::types::tool_id`] of their name, so at most
/// one record exists per name and `upsert` replaces it wholesale.
#[async_trait]
pub trait ToolStoreAdapter: PluginAdapter {
    /// Inserts or fully replaces the record with the same name.
    async fn upsert(&self, record: &ToolRecord) -> Result<(), ForgeError>;

    /// Fetches a record by exact name.
    async fn get(&self, name: &str) -> Result<Option<ToolRecord>, ForgeError>;

    /// Returns up to `limit` records ordered by ascending cosine distance
    /// to `text`.
    async fn query_similar(&self, text: &str, limit: usize)
    -> Result<Vec<ScoredTool>, ForgeError>;

    /// Returns every stored record ordered by name.
    async fn get_all(&self) -> Result<Vec<ToolRecord>, ForgeError>;

    /// Removes a record by name. Returns true if a record was removed.
    async fn delete(&self, name: &str) -> Result<bool, ForgeError>;
}
