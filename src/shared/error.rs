//! Application Error Types
//!
//! Centralized error handling for the persistence gateway. Gateway failures
//! never cross the session boundary: each call site converts the error into
//! a protocol line for the affected client and logs it.

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
