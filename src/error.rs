//! Error types for testaccounts
//!
//! All errors in the crate are converted to `AppError`. Per-user failures are
//! collected into run reports by the services; only startup errors and the
//! few fatal conditions documented on each service leave `run`.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// The configured OAuth client is not registered
    #[error("Application with client_id '{0}' not found")]
    ApplicationNotFound(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials CSV error
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Password hashing or key generation error
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
