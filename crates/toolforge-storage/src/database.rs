// SPDX-FileCopyrightText: 2026 Toolforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup: PRAGMAs, WAL mode and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread, so
//! writes are serialized without extra locking.

use std::path::Path;
use std::sync::Arc;

use tokio_rusqlite::Connection;
use toolforge_config::StorageConfig;
use toolforge_core::ForgeError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Maps a tokio-rusqlite failure into a storage error.
pub(crate) fn map_tr_err<E: std::fmt::Display>(e: tokio_rusqlite::Error<E>) -> ForgeError {
    ForgeError::storage(e.to_string())
}

fn open_err(e: rusqlite::Error) -> ForgeError {
    ForgeError::Storage {
        source: Box::new(e),
    }
}

/// A migrated SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Connection>,
}

impl Database {
    /// Opens (creating if needed) the database file named in `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, ForgeError> {
        let path = Path::new(&config.database_path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ForgeError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path).await.map_err(open_err)?;
        let wal_mode = config.wal_mode;
        conn.call(move |conn| -> Result<(), ForgeError> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;"
            ))
            .map_err(|e| ForgeError::Storage {
                source: Box::new(e),
            })?;
            run_migrations(conn)
        })
        .await
        .map_err(map_tr_err)?;

        info!(path = %config.database_path, wal_mode, "tool database opened");
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Opens a private in-memory database. Contents vanish on drop.
    pub async fn open_in_memory() -> Result<Self, ForgeError> {
        let conn = Connection::open_in_memory().await.map_err(open_err)?;
        conn.call(|conn| -> Result<(), ForgeError> { run_migrations(conn) })
            .await
            .map_err(map_tr_err)?;
        debug!("in-memory tool database opened");
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    /// Flushes the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), ForgeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tools.db");
        let config = StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let db = Database::open(&config).await.unwrap();
        assert!(path.exists());

        let tables: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'tools'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(tables, 1);
        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_does_not_rerun_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("tools.db").to_string_lossy().into_owned(),
            wal_mode: false,
        };
        drop(Database::open(&config).await.unwrap());
        assert!(Database::open(&config).await.is_ok());
    }

    #[tokio::test]
    async fn unopenable_path_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let err = Database::open(&config).await.err().expect("a directory is not a database");
        assert!(matches!(err, ForgeError::Storage { .. }));
    }

    #[tokio::test]
    async fn in_memory_database_is_migrated() {
        let db = Database::open_in_memory().await.unwrap();
        let rows: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM tools", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }
}
