//! Core error types for focusstreak-core.
//!
//! This module defines the error hierarchy using thiserror. Every error
//! carries enough context for a host layer to map it to a transport
//! status code via [`CoreError::status_code`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusstreak-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors (store unreachable or write failure)
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Missing or malformed request data
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No authenticated user for the operation
    #[error("Not authenticated: {0}")]
    Auth(String),

    /// Referenced user or session does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// HTTP-equivalent status code for host layers.
    ///
    /// Validation maps to 400, missing auth to 401, missing records to
    /// 404, everything else to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Validation(_) => 400,
            CoreError::Auth(_) => 401,
            CoreError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required request field is missing or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        let validation: CoreError = ValidationError::MissingField("sessionId").into();
        assert_eq!(validation.status_code(), 400);
        assert_eq!(CoreError::Auth("no user".into()).status_code(), 401);
        assert_eq!(CoreError::NotFound("user x".into()).status_code(), 404);
        let persistence: CoreError = DatabaseError::Locked.into();
        assert_eq!(persistence.status_code(), 500);
    }
}
