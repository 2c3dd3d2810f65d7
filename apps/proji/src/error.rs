//! Custom error types for proji
//!
//! This module provides a unified error type shared by the class store,
//! the project tracker and the remote tree fetchers.

use thiserror::Error;

/// Main error type for proji operations
#[derive(Error, Debug)]
pub enum ProjiError {
    /// Any storage fault not covered by a more specific variant
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entity not found errors
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// A uniqueness constraint rejected the write
    #[error("{entity} already exists: {name}")]
    AlreadyExists {
        entity: &'static str,
        name: String,
    },

    /// Rollback or compensating cleanup failed after a write error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A repository URL or identifier could not be parsed
    #[error("Invalid repository identifier: {0}")]
    InvalidIdentifier(String),

    /// Remote fetch errors
    #[error("Network error: {0}")]
    Network(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mutex lock errors
    #[error("Lock error: {0}")]
    Lock(String),
}

impl ProjiError {
    /// Create a not found error
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(entity: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity,
            name: name.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a lock error
    pub fn lock(msg: impl Into<String>) -> Self {
        Self::Lock(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

fn constraint_code(err: &rusqlite::Error) -> Option<std::ffi::c_int> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

/// Returns true when a UNIQUE constraint rejected the statement
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

/// Returns true when a FOREIGN KEY constraint rejected the statement
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    constraint_code(err) == Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

impl From<config::ConfigError> for ProjiError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias using ProjiError
pub type Result<T> = std::result::Result<T, ProjiError>;
