// SPDX-FileCopyrightText: 2026 Sokoni Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use sokoni_core::SokoniError;

use crate::migrations;

/// Handle to the SQLite database.
///
/// Cheap to clone; all clones share the same background connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// all pending migrations.
    pub async fn open(path: &str) -> Result<Self, SokoniError> {
        Self::open_with_wal(path, true).await
    }

    /// Open with explicit control over WAL mode.
    pub async fn open_with_wal(path: &str, wal: bool) -> Result<Self, SokoniError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SokoniError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(tokio_rusqlite::Error::from)
            .map_err(map_tr_err)?;

        conn.call(move |conn| -> Result<(), SokoniError> {
            let journal = if wal { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            ))
            .map_err(|e| SokoniError::Storage {
                source: Box::new(e),
            })?;
            migrations::run_migrations(conn).map_err(|e| SokoniError::Storage {
                source: Box::new(e),
            })?;
            Ok(())
        })
        .await
        .map_err(|e: tokio_rusqlite::Error<SokoniError>| SokoniError::Storage {
            source: Box::new(e),
        })?;

        Ok(Self { conn })
    }

    /// Returns the underlying tokio-rusqlite connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), SokoniError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Map a tokio-rusqlite error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> SokoniError {
    SokoniError::Storage {
        source: Box::new(e),
    }
}
