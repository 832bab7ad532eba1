// Error types for ghlens.
// Storage failures are absorbed by the cache; everything in `GhError` reaches the caller.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of the underlying key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum GhError {
    #[error("GitHub API rate limit exceeded, resets at {reset_at}")]
    RateLimitExceeded { reset_at: DateTime<Utc> },

    #[error("Invalid GitHub name: {0:?}")]
    InvalidIdentity(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response shape: {0}")]
    Schema(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GhError {
    /// Status code carried by an `Api` error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            GhError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GhError::RateLimitExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, GhError>;
