//! Synchronization settings shared by every front end.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::Cipher;
use crate::error::{NotesError, Result};
use crate::retry::RetryPolicy;

/// Quiet period before a burst of edits is written out.
pub const DEFAULT_SAVE_DELAY_MS: u64 = 200;

/// scrypt work factor for note records.
///
/// Notes are encrypted under the random session passphrase, which needs no
/// stretching.
pub const DEFAULT_NOTE_WORK_FACTOR: u8 = 10;

/// Settings for the cipher adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    /// scrypt work factor (log2 N) protecting the credential record.
    ///
    /// `None` lets age calibrate the work factor to the local machine.
    pub work_factor: Option<u8>,
    /// scrypt work factor (log2 N) for note records.
    pub note_work_factor: u8,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            work_factor: None,
            note_work_factor: DEFAULT_NOTE_WORK_FACTOR,
        }
    }
}

/// Settings for the note synchronization layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Debounce window for note saves, in milliseconds.
    pub save_delay_ms: u64,
    /// Retry policy for remote operations.
    pub retry: RetryPolicy,
    /// Cipher settings.
    pub cipher: CipherConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            save_delay_ms: DEFAULT_SAVE_DELAY_MS,
            retry: RetryPolicy::default(),
            cipher: CipherConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    /// Cipher hardening the user's password over the credential record.
    pub fn credential_cipher(&self) -> Cipher {
        match self.cipher.work_factor {
            Some(log_n) => Cipher::with_work_factor(log_n),
            None => Cipher::new(),
        }
    }

    /// Cipher for note records.
    pub fn note_cipher(&self) -> Cipher {
        Cipher::with_work_factor(self.cipher.note_work_factor)
    }

    /// Reject settings that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(NotesError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(NotesError::Config(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms".to_string(),
            ));
        }
        if let Some(log_n) = self.cipher.work_factor {
            check_work_factor("cipher.work_factor", log_n)?;
        }
        check_work_factor("cipher.note_work_factor", self.cipher.note_work_factor)
    }
}

fn check_work_factor(name: &str, log_n: u8) -> Result<()> {
    if (1..=30).contains(&log_n) {
        Ok(())
    } else {
        Err(NotesError::Config(format!(
            "{} must be between 1 and 30 (got {})",
            name, log_n
        )))
    }
}
