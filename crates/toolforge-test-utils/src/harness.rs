// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for lifecycle integration tests.
//!
//! `TestHarness` wires a mock provider, a scripted runtime and a real
//! SQLite tool store (temp file, hashing embedder) together. Tests build a
//! `ToolManager` from its `Arc`s.

use std::sync::Arc;

use toolforge_config::StorageConfig;
use toolforge_core::{ForgeError, ToolRecord, ToolStoreAdapter};
use toolforge_embedding::HashingEmbedder;
use toolforge_storage::{Database, ToolStore};

use crate::mock_provider::MockProvider;
use crate::scripted_runtime::ScriptedRuntime;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    runtime: Option<ScriptedRuntime>,
    tools: Vec<ToolRecord>,
    dimensions: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            runtime: None,
            tools: Vec::new(),
            dimensions: 384,
        }
    }

    /// Replies the mock provider returns, in order.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_runtime(mut self, runtime: ScriptedRuntime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Records stored before the harness is handed out.
    pub fn with_tool(mut self, record: ToolRecord) -> Self {
        self.tools.push(record);
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ForgeError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| ForgeError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("tools.db");
        let db = Database::open(&StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        })
        .await?;

        let embedder = Arc::new(HashingEmbedder::new(self.dimensions));
        let store = Arc::new(ToolStore::new(db, embedder.clone()));
        for record in &self.tools {
            store.upsert(record).await?;
        }

        Ok(TestHarness {
            provider: Arc::new(MockProvider::with_responses(self.responses)),
            runtime: Arc::new(self.runtime.unwrap_or_default()),
            store,
            embedder,
            _temp_dir: temp_dir,
        })
    }
}

/// Mock collaborators plus a real tool store.
pub struct TestHarness {
    pub provider: Arc<MockProvider>,
    pub runtime: Arc<ScriptedRuntime>,
    /// SQLite store in a temp directory, removed on drop.
    pub store: Arc<ToolStore>,
    pub embedder: Arc<HashingEmbedder>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Stored record for `name`.
    pub async fn stored(&self, name: &str) -> Result<Option<ToolRecord>, ForgeError> {
        self.store.get(name).await
    }
}
