//! Error types for Notes core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for Notes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Core error type for Notes operations.
#[derive(Debug, Error)]
pub enum NotesError {
    /// Login rejected for an existing user
    #[error("{0}")]
    Auth(String),

    /// Ciphertext did not authenticate under the supplied passphrase
    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    /// Encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Remote store read/write failure
    #[error("Network error: {0}")]
    Network(String),

    /// Stored record could not be decoded
    #[error("Malformed record {key}: {reason}")]
    Decode { key: String, reason: String },

    /// Local storage error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific local storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl NotesError {
    /// Whether retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotesError::Network(_))
    }

    pub(crate) fn invalid_credentials() -> Self {
        NotesError::Auth("Invalid credentials for existing user".to_string())
    }
}

impl From<tokio::task::JoinError> for NotesError {
    fn from(err: tokio::task::JoinError) -> Self {
        NotesError::Other(format!("Background task failed: {}", err))
    }
}
