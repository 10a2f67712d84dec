//! Error types for model operations.

use thiserror::Error;

/// Main error type for model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Unknown option key: {0}")]
    UnknownKey(String),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Serialization(e.to_string())
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
