// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`ToolStoreAdapter`].
//!
//! Each row holds the tool metadata, the searchable document (which is the
//! only place the source lives) and the document's embedding. Similarity
//! search is a full scan with cosine distance, which is plenty for the
//! hundreds of tools a single agent accumulates.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;
use toolforge_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, ForgeError, HealthStatus, ParameterMap,
    PluginAdapter, ScoredTool, ToolRecord, ToolStoreAdapter, tool_id,
};
use tracing::{debug, warn};

use crate::database::{Database, map_tr_err};
use crate::document::{encode_document, extract_code};
use crate::vector::{blob_to_vec, cosine_distance, vec_to_blob};

const SELECT_COLUMNS: &str =
    "id, tool_name, description, parameters_json, version, error_log_json, document";

/// A row as read from SQLite, before lenient JSON decoding.
struct ToolRow {
    id: String,
    name: String,
    description: String,
    parameters_json: String,
    version: i64,
    error_log_json: String,
    document: String,
}

impl ToolRow {
    fn from_row(row: &rusqlite::Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            parameters_json: row.get(3)?,
            version: row.get(4)?,
            error_log_json: row.get(5)?,
            document: row.get(6)?,
        })
    }

    /// Decodes the JSON columns, falling back to empty values on corruption
    /// so one damaged row never hides the rest of the store.
    fn into_record(self) -> ToolRecord {
        let parameters: ParameterMap = serde_json::from_str(&self.parameters_json)
            .unwrap_or_else(|e| {
                warn!(tool = %self.name, error = %e, "unreadable parameters_json, using empty map");
                ParameterMap::new()
            });
        let error_log: Vec<String> =
            serde_json::from_str(&self.error_log_json).unwrap_or_else(|e| {
                warn!(tool = %self.name, error = %e, "unreadable error_log_json, using empty log");
                Vec::new()
            });
        let version = u32::try_from(self.version).unwrap_or(1).max(1);

        ToolRecord {
            code: extract_code(&self.document, &self.name, &self.description).to_string(),
            id: self.id,
            name: self.name,
            description: self.description,
            parameters,
            version,
            error_log,
        }
    }
}

/// Tool records persisted in SQLite with embedding-based lookup.
pub struct ToolStore {
    db: Database,
    embedder: Arc<dyn EmbeddingAdapter>,
}

impl ToolStore {
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self { db, embedder }
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ForgeError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ForgeError::Embedding {
                message: "embedder returned no vectors".into(),
                source: None,
            })
    }
}

#[async_trait]
impl PluginAdapter for ToolStore {
    fn name(&self) -> &str {
        "sqlite-tool-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ToolStore
    }

    async fn health_check(&self) -> Result<HealthStatus, ForgeError> {
        let count = self
            .db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM tools", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        debug!(tools = count, "tool store healthy");
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ForgeError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl ToolStoreAdapter for ToolStore {
    async fn upsert(&self, record: &ToolRecord) -> Result<(), ForgeError> {
        let document = encode_document(&record.name, &record.description, &record.code);
        let embedding = vec_to_blob(&self.embed_one(&document).await?);
        let parameters_json = serde_json::to_string(&record.parameters).map_err(|e| {
            ForgeError::Storage {
                source: Box::new(e),
            }
        })?;
        let error_log_json =
            serde_json::to_string(&record.error_log).map_err(|e| ForgeError::Storage {
                source: Box::new(e),
            })?;

        let id = tool_id(&record.name);
        let name = record.name.clone();
        let description = record.description.clone();
        let version = i64::from(record.version);
        let now = Utc::now().to_rfc3339();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO tools \
                     (id, tool_name, description, parameters_json, version, error_log_json, \
                      document, embedding, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) \
                     ON CONFLICT(id) DO UPDATE SET \
                       tool_name = excluded.tool_name, \
                       description = excluded.description, \
                       parameters_json = excluded.parameters_json, \
                       version = excluded.version, \
                       error_log_json = excluded.error_log_json, \
                       document = excluded.document, \
                       embedding = excluded.embedding, \
                       updated_at = excluded.updated_at",
                    rusqlite::params![
                        id,
                        name,
                        description,
                        parameters_json,
                        version,
                        error_log_json,
                        document,
                        embedding,
                        now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        debug!(tool = %record.name, version = record.version, "tool upserted");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<ToolRecord>, ForgeError> {
        let id = tool_id(name);
        let row = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<ToolRow>, rusqlite::Error> {
                conn.query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM tools WHERE id = ?1"),
                    rusqlite::params![id],
                    ToolRow::from_row,
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;
        Ok(row.map(ToolRow::into_record))
    }

    async fn query_similar(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<ScoredTool>, ForgeError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let query = self.embed_one(text).await?;

        let rows = self
            .db
            .connection()
            .call(|conn| -> Result<Vec<(ToolRow, Vec<u8>)>, rusqlite::Error> {
                let mut stmt =
                    conn.prepare(&format!("SELECT {SELECT_COLUMNS}, embedding FROM tools"))?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((ToolRow::from_row(row)?, row.get::<_, Vec<u8>>(7)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        let mut scored: Vec<ScoredTool> = rows
            .into_iter()
            .filter_map(|(row, blob)| {
                let stored = blob_to_vec(&blob);
                match cosine_distance(&query, &stored) {
                    Some(distance) => Some(ScoredTool {
                        record: row.into_record(),
                        distance,
                    }),
                    None => {
                        debug!(
                            tool = %row.name,
                            stored_dims = stored.len(),
                            query_dims = query.len(),
                            "skipping tool embedded with a different model"
                        );
                        None
                    }
                }
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn get_all(&self) -> Result<Vec<ToolRecord>, ForgeError> {
        let rows = self
            .db
            .connection()
            .call(|conn| -> Result<Vec<ToolRow>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM tools ORDER BY tool_name"
                ))?;
                let rows = stmt
                    .query_map([], ToolRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;
        Ok(rows.into_iter().map(ToolRow::into_record).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, ForgeError> {
        let id = tool_id(name);
        let removed = self
            .db
            .connection()
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM tools WHERE id = ?1", rusqlite::params![id])
            })
            .await
            .map_err(map_tr_err)?;
        debug!(tool = name, removed, "tool delete");
        Ok(removed > 0)
    }
}
