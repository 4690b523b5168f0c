//! CLI error types for structured error handling.
//!
//! This module provides typed errors that map to specific exit codes,
//! enabling consistent error handling across the CLI. Core errors that reach
//! the top level are mapped the same way.

use std::fmt;

use notes_core::NotesError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (user, note)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// Changes could not be written to the remote store
    SyncFailed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::SyncFailed(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    /// Create a SyncFailed error.
    pub fn sync_failed(message: impl Into<String>) -> Self {
        CliError::SyncFailed(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::SyncFailed(_) => exit_codes::SYNC_FAILED,
        }
    }
}

/// Exit code for a core error.
fn core_exit_code(err: &NotesError) -> i32 {
    match err {
        NotesError::Auth(_) | NotesError::IncorrectPassphrase => exit_codes::AUTH_FAILED,
        NotesError::NotFound(_) => exit_codes::NOT_FOUND,
        NotesError::InvalidInput(_) | NotesError::Config(_) => exit_codes::INVALID_INPUT,
        NotesError::Network(_) => exit_codes::SYNC_FAILED,
        _ => exit_codes::GENERAL,
    }
}

/// Exit code for any error that reached `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    if let Some(core_err) = err.downcast_ref::<NotesError>() {
        return core_exit_code(core_err);
    }
    exit_codes::GENERAL
}

/// Contextual hint for well-known failures.
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<NotesError>()? {
        NotesError::Auth(_) => Some("Hint: Check your password or set NOTES_PASSWORD."),
        NotesError::Network(_) => {
            Some("Hint: The remote store is unreachable; check [remote] path in your config.")
        }
        _ => None,
    }
}
