//! Error types for researchtrail-core

use thiserror::Error;

/// Main error type for the researchtrail-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Project not found
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// Session not found
    #[error("session not found: {0}")]
    SessionNotFound(String),
}

/// Result type alias for researchtrail-core
pub type Result<T> = std::result::Result<T, Error>;
