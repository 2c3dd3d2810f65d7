pub mod models;
pub mod repository;
pub mod schema;

// Re-export for convenience
pub use models::*;

use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::error::{ProjiError, Result};

/// Handle to the local class and project store
///
/// Every operation holds the connection lock for its full duration, so a
/// save or remove owns its transaction until it commits or rolls back.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!(path = %path.display(), "Opening database");
        Self::init(Connection::open(path)?)
    }

    /// Open the database configured in `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(config.database_path()?)
    }

    /// Create a fully initialized in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Enable foreign keys
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        // Initialize schema (creates tables if they don't exist)
        schema::init_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Close the underlying connection, reporting any error SQLite raises
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|e| ProjiError::lock(e.to_string()))?;
        conn.close().map_err(|(_, e)| ProjiError::Database(e))
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ProjiError::lock(e.to_string()))
    }
}

/// Create an in-memory database for testing
#[cfg(test)]
pub fn create_test_database() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}
