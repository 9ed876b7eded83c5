//! Database operations using rusqlite.
//!
//! Owns the SQLite connection and the schema migrations. Domain managers borrow the
//! connection through [`Database::connection`]; the column helpers at the bottom of
//! this file keep the on-disk formats for ids, timestamps and dates in one place.

use crate::storage::schema::{CURRENT_VERSION, MIGRATION_V2, SCHEMA, SCHEMA_VERSION_TABLE};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Result as SqliteResult, Row};
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

/// Date format used for due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        tracing::debug!(path = %path.display(), "Opened database");
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        // Cascades on results/comments/rosters rely on this
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        self.conn
            .execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = self.schema_version()?;

        if current_version < CURRENT_VERSION {
            self.migrate(current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    pub fn schema_version(&self) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Run database migrations.
    fn migrate(&self, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            self.apply_migration(1, SCHEMA)?;
        }
        if from_version < 2 {
            self.apply_migration(2, MIGRATION_V2)?;
        }

        tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        Ok(())
    }

    fn apply_migration(&self, version: i32, sql: &str) -> Result<(), DatabaseError> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
            [version],
        )
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        tx.commit()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Format a timestamp for storage.
///
/// Fixed-width UTC text, so lexical comparison in SQL matches chronological order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Format a due date for storage.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Read a UUID stored as text.
pub fn uuid_column(row: &Row<'_>, idx: usize) -> SqliteResult<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a timestamp written by [`format_timestamp`].
pub fn timestamp_column(row: &Row<'_>, idx: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a date written by [`format_date`].
pub fn date_column(row: &Row<'_>, idx: usize) -> SqliteResult<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Whether an error is a UNIQUE / PRIMARY KEY constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}
