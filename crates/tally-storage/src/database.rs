// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. The [`Database`] handle is the only writer; query modules take
//! `&Database` and go through [`Database::connection`].

use tally_core::TallyError;
use tracing::debug;

/// Timestamp layout of `sales.created_at` (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date layout used in `date(created_at)` comparisons.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An open, migrated ledger database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs and run migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, TallyError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(sql_err)?;
        Self::prepare(conn, wal_mode).await
    }

    /// Open a private in-memory database. Used by tests.
    pub async fn open_in_memory() -> Result<Self, TallyError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(sql_err)?;
        Self::prepare(conn, false).await
    }

    async fn prepare(conn: tokio_rusqlite::Connection, wal_mode: bool) -> Result<Self, TallyError> {
        conn.call(move |conn| -> Result<(), TallyError> {
            let journal = if wal_mode { "WAL" } else { "DELETE" };
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = {journal};
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;"
            ))
            .map_err(sql_err)?;
            crate::migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_tr_err)?;
        debug!(wal_mode, "ledger database ready");
        Ok(Self { conn })
    }

    /// The single serialized connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), TallyError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into `TallyError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> TallyError {
    TallyError::Storage {
        source: Box::new(e),
    }
}

/// Unwrap a domain error raised inside a `call` closure.
pub fn flatten_tr_err(e: tokio_rusqlite::Error<TallyError>) -> TallyError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => TallyError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// Convert a rusqlite error into `TallyError::Storage`.
pub fn sql_err(e: rusqlite::Error) -> TallyError {
    TallyError::Storage {
        source: Box::new(e),
    }
}

/// True for UNIQUE / CHECK / FOREIGN KEY violations.
pub fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
