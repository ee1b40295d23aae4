//! Workspace error type

use thiserror::Error;

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Failures the reconciliation engine can surface
///
/// Database and filesystem errors convert implicitly via `?`; the remaining
/// variants are raised explicitly at the boundary that detects them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A referenced track or candidate does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored data that should be well-formed is not (e.g. a bad guid)
    #[error("Internal error: {0}")]
    Internal(String),
}
