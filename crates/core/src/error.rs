//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid item metadata: {0}")]
    InvalidItem(String),

    #[error("invalid password hash: {0}")]
    InvalidPasswordHash(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
