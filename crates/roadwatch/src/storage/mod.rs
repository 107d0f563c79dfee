//! Storage layer for roadwatch.
//!
//! This module provides `SQLite`-based persistent storage for advisories.
//! All access goes through a single connection guarded by a mutex, so writes
//! are serialized and each operation is one atomic statement.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use tracing::{debug, info};

use crate::advisory::{Advisory, Category, Position};
use crate::error::{Error, Result};
use crate::recurrence::{Days, Recurrence, TimeWindow};

/// How long a statement waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str =
    "id, category, lat, lon, speed_limit, created_at, days, time_from, time_to";

/// Durable store of advisories.
///
/// Provides create, list, update and delete with full validation. The store
/// is `Sync`; share it between request handlers with an `Arc`.
#[derive(Debug)]
pub struct AdvisoryStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl AdvisoryStore {
    /// Open or create a store at the given path with the default busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// An existing schema is kept as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("connection lock poisoned".to_string()))
    }

    /// Validate and persist a new advisory, returning its assigned id.
    ///
    /// Any `id` already set on `advisory` is ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error before touching the database if the
    /// advisory is malformed, or a storage error if the insert fails.
    pub fn create(&self, advisory: &Advisory) -> Result<i64> {
        let advisory = advisory.normalized()?;
        let recurrence = &advisory.recurrence;

        let conn = self.connection()?;
        conn.execute(
            r"
            INSERT INTO advisories
                (category, lat, lon, speed_limit, created_at, days, time_from, time_to)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                advisory.category,
                advisory.position.lat,
                advisory.position.lon,
                advisory.speed_limit,
                advisory.created_at,
                recurrence.days,
                recurrence.time_from_text(),
                recurrence.time_to_text(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!(id, category = %advisory.category, "Created advisory");
        Ok(id)
    }

    /// Get every persisted advisory, in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<Advisory>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM advisories ORDER BY id ASC"
        ))?;

        let advisories = stmt
            .query_map([], Self::row_to_advisory)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(advisories)
    }

    /// Get an advisory by its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<Advisory>> {
        let conn = self.connection()?;
        let advisory = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM advisories WHERE id = ?1"),
                [id],
                Self::row_to_advisory,
            )
            .optional()?;
        Ok(advisory)
    }

    /// Replace every field of the advisory with the given id.
    ///
    /// This is a full replace: cleared recurrence fields on `advisory` clear
    /// the stored ones. Any `id` set on `advisory` is ignored in favour of `id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the advisory is malformed,
    /// [`Error::NotFound`] if no advisory has this id, or a storage error.
    pub fn update(&self, id: i64, advisory: &Advisory) -> Result<()> {
        let advisory = advisory.normalized()?;
        let recurrence = &advisory.recurrence;

        let conn = self.connection()?;
        let affected = conn.execute(
            r"
            UPDATE advisories SET
                category = ?1, lat = ?2, lon = ?3, speed_limit = ?4, created_at = ?5,
                days = ?6, time_from = ?7, time_to = ?8
            WHERE id = ?9
            ",
            params![
                advisory.category,
                advisory.position.lat,
                advisory.position.lon,
                advisory.speed_limit,
                advisory.created_at,
                recurrence.days,
                recurrence.time_from_text(),
                recurrence.time_to_text(),
                id,
            ],
        )?;

        if affected == 0 {
            return Err(Error::not_found(id));
        }
        debug!(id, "Updated advisory");
        Ok(())
    }

    /// Permanently delete an advisory.
    ///
    /// Deleting an id that does not exist, including one already deleted,
    /// fails with [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no advisory has this id, or a storage error.
    pub fn delete(&self, id: i64) -> Result<()> {
        let affected = self
            .connection()?
            .execute("DELETE FROM advisories WHERE id = ?1", [id])?;

        if affected == 0 {
            return Err(Error::not_found(id));
        }
        debug!(id, "Deleted advisory");
        Ok(())
    }

    /// Count persisted advisories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 =
            self.connection()?
                .query_row("SELECT COUNT(*) FROM advisories", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Convert a database row to an Advisory.
    fn row_to_advisory(row: &rusqlite::Row) -> rusqlite::Result<Advisory> {
        let time_from: String = row.get(7)?;
        let time_to: String = row.get(8)?;
        let time_window = TimeWindow::parse(&time_from, &time_to)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

        Ok(Advisory {
            id: Some(row.get(0)?),
            category: row.get(1)?,
            position: Position::new(row.get(2)?, row.get(3)?),
            speed_limit: row.get(4)?,
            created_at: row.get(5)?,
            recurrence: Recurrence {
                days: row.get(6)?,
                time_window,
            },
        })
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Days {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Days {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Days::parse(value.as_str()?).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
