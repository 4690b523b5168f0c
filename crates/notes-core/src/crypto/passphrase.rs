//! Login password checks and session passphrase generation.

use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::{NotesError, Result};

/// Validate a login password before it is used as a key.
///
/// Only blank passwords are rejected; any non-blank password can register a
/// new user.
pub fn validate_password(password: &str) -> Result<()> {
    if password.trim().is_empty() {
        return Err(NotesError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Generate a fresh random session passphrase (a v4 UUID string).
pub fn generate_passphrase() -> Zeroizing<String> {
    Zeroizing::new(Uuid::new_v4().to_string())
}
