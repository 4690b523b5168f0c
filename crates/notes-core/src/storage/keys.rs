//! Remote record layout.
//!
//! ```text
//! creds/<username>:passphrase        {"creds": "<passphrase ciphertext>"}
//! notes/<username>:notes:<note id>   {"encryptedNote": "<note ciphertext>"}
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NotesError, Result};

/// Root of the credential table.
pub const CREDS_ROOT: &str = "creds";

/// Root of the note namespace.
pub const NOTES_ROOT: &str = "notes";

const DELIMITER: char = ':';
const PASSPHRASE_SUFFIX: &str = "passphrase";
const NOTES_SEGMENT: &str = "notes";
const MAX_USERNAME_BYTES: usize = 64;
const FORBIDDEN: [char; 6] = [DELIMITER, '/', '#', '$', '[', ']'];

/// Value of a credential record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub creds: String,
}

/// Value of a note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    #[serde(rename = "encryptedNote")]
    pub encrypted_note: String,
}

/// Reject usernames that cannot be embedded in a record key.
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(NotesError::InvalidInput(
            "Username cannot be empty".to_string(),
        ));
    }
    if username.len() > MAX_USERNAME_BYTES {
        return Err(NotesError::InvalidInput(format!(
            "Username too long (max {} bytes)",
            MAX_USERNAME_BYTES
        )));
    }
    if username
        .chars()
        .any(|c| FORBIDDEN.contains(&c) || c.is_control())
    {
        return Err(NotesError::InvalidInput(
            "Username contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Path of the credential record for `username`.
pub fn credential_path(username: &str) -> String {
    format!(
        "{}/{}{}{}",
        CREDS_ROOT, username, DELIMITER, PASSPHRASE_SUFFIX
    )
}

/// Key (below [`NOTES_ROOT`]) of a note record.
pub fn note_key(username: &str, id: &Uuid) -> String {
    format!(
        "{}{}{}{}{}",
        username, DELIMITER, NOTES_SEGMENT, DELIMITER, id
    )
}

/// Full path of a note record.
pub fn note_path(username: &str, id: &Uuid) -> String {
    format!("{}/{}", NOTES_ROOT, note_key(username, id))
}

/// A parsed note record key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteKey {
    pub username: String,
    pub note_id: Uuid,
}

impl NoteKey {
    /// Parse `<username>:notes:<uuid>`.
    pub fn parse(key: &str) -> Result<Self> {
        let malformed = |reason: &str| NotesError::Decode {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = key.split(DELIMITER);
        let (Some(username), Some(segment), Some(id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected <username>:notes:<id>"));
        };

        if username.is_empty() || segment != NOTES_SEGMENT {
            return Err(malformed("expected <username>:notes:<id>"));
        }

        let note_id = Uuid::parse_str(id).map_err(|e| malformed(&e.to_string()))?;
        Ok(Self {
            username: username.to_string(),
            note_id,
        })
    }

    /// Username segment of a key, without validating the rest.
    pub fn username_of(key: &str) -> &str {
        key.split(DELIMITER).next().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let id = Uuid::parse_str("6f1c1f4e-4a0b-4c1e-9d55-0d6f7f1b2a3c").unwrap();
        assert_eq!(credential_path("alice"), "creds/alice:passphrase");
        assert_eq!(
            note_path("alice", &id),
            "notes/alice:notes:6f1c1f4e-4a0b-4c1e-9d55-0d6f7f1b2a3c"
        );
    }

    #[test]
    fn test_note_key_parse() {
        let id = Uuid::new_v4();
        let parsed = NoteKey::parse(&note_key("bob", &id)).unwrap();
        assert_eq!(parsed.username, "bob");
        assert_eq!(parsed.note_id, id);
    }

    #[test]
    fn test_note_key_parse_rejects_malformed() {
        assert!(NoteKey::parse("bob:notes").is_err());
        assert!(NoteKey::parse("bob:other:6f1c1f4e-4a0b-4c1e-9d55-0d6f7f1b2a3c").is_err());
        assert!(NoteKey::parse("bob:notes:not-a-uuid").is_err());
        assert!(NoteKey::parse(":notes:6f1c1f4e-4a0b-4c1e-9d55-0d6f7f1b2a3c").is_err());
    }

    #[test]
    fn test_username_of() {
        assert_eq!(NoteKey::username_of("bob:notes:x"), "bob");
        assert_eq!(NoteKey::username_of(""), "");
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("john.doe").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("  ").is_err());
        assert!(validate_username("a:b").is_err());
        assert!(validate_username("a/b").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_record_shapes() {
        let record = NoteRecord {
            encrypted_note: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({"encryptedNote": "abc"})
        );
        let creds: CredentialRecord =
            serde_json::from_value(serde_json::json!({"creds": "xyz"})).unwrap();
        assert_eq!(creds.creds, "xyz");
    }
}
