//! `SQLite` document store.
//!
//! One database file holds every collection. Each collection's trait impl
//! lives in its own submodule; they share the connection, the row
//! conversion helpers in [`rows`] and the metrics helper.
//!
//! ## Module Structure
//!
//! - [`connection`]: lock acquisition with poison recovery, pragmas, transactions
//! - [`schema`]: table and index DDL
//! - [`rows`]: column encoding and row → model conversion
//! - `users`, `workspace`, `nodes`, `archives`: trait impls per collection

mod archives;
mod connection;
mod metrics;
mod nodes;
mod rows;
mod schema;
mod users;
mod workspace;

pub use connection::{acquire_lock, configure_connection, in_transaction};
pub use metrics::record_operation_metrics;

use crate::{Error, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

const BACKEND: &str = "sqlite";

/// `SQLite`-backed implementation of every storage trait.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// WAL mode and `busy_timeout` keep contention cheap for a single-process
/// server.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (or creates) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::failed("create_data_dir", e))?;
        }
        let conn = Connection::open(&db_path).map_err(|e| Error::failed("open_sqlite", e))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::failed("open_sqlite_in_memory", e))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;
        schema::create_tables(&conn)
    }

    /// Runs one store operation under the lock and records its metrics.
    fn with_conn<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = {
            let conn = acquire_lock(&self.conn);
            f(&conn)
        };
        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics(BACKEND, operation, start, status);
        result
    }
}

/// Maps a rusqlite error into [`Error::OperationFailed`] for `operation`.
fn sql_err(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::failed(operation, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_has_no_path() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.db_path().is_none());
    }

    #[test]
    fn test_file_backed_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("flowtion.db");
        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.db_path(), Some(&path));
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flowtion.db");
        drop(SqliteStore::new(&path).unwrap());
        assert!(SqliteStore::new(&path).is_ok());
    }
}
