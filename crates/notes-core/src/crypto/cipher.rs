//! Age passphrase encryption with a transport-safe string encoding.
//!
//! Age's scrypt recipient authenticates the file key and the payload, so a
//! wrong passphrase is always reported as [`NotesError::IncorrectPassphrase`]
//! rather than yielding garbage plaintext.

use std::io::{Read, Write};
use std::iter;

use age::secrecy::SecretString;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{NotesError, Result};

/// Lowest scrypt work factor a fixed-work-factor cipher will accept on decrypt.
///
/// Covers records written by age's calibrated default on typical hardware.
pub const MIN_DECRYPT_WORK_FACTOR_CAP: u8 = 22;

/// Passphrase-based symmetric cipher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cipher {
    work_factor: Option<u8>,
}

impl Cipher {
    /// Cipher using age's calibrated scrypt work factor.
    pub fn new() -> Self {
        Self { work_factor: None }
    }

    /// Cipher using a fixed scrypt work factor (log2 N) for encryption.
    pub fn with_work_factor(log_n: u8) -> Self {
        Self {
            work_factor: Some(log_n),
        }
    }

    /// Highest scrypt work factor [`Cipher::decrypt`] accepts.
    ///
    /// `None` leaves age's calibrated cap in place.
    pub fn max_decrypt_work_factor(&self) -> Option<u8> {
        self.work_factor
            .map(|log_n| log_n.max(MIN_DECRYPT_WORK_FACTOR_CAP))
    }

    /// Encrypt bytes under `passphrase`.
    pub fn encrypt(&self, data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        let secret = SecretString::from(passphrase.to_string());
        let encryptor = match self.work_factor {
            Some(log_n) => {
                let mut recipient = age::scrypt::Recipient::new(secret);
                recipient.set_work_factor(log_n);
                age::Encryptor::with_recipients(iter::once(&recipient as &dyn age::Recipient))
                    .map_err(|e| NotesError::Crypto(format!("Failed to create encryptor: {}", e)))?
            }
            None => age::Encryptor::with_user_passphrase(secret),
        };

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| NotesError::Crypto(format!("Failed to create encryptor: {}", e)))?;

        writer
            .write_all(data)
            .map_err(|e| NotesError::Crypto(format!("Encryption write failed: {}", e)))?;

        writer
            .finish()
            .map_err(|e| NotesError::Crypto(format!("Encryption finish failed: {}", e)))?;

        Ok(encrypted)
    }

    /// Decrypt bytes produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `NotesError::IncorrectPassphrase` when the passphrase does not
    /// authenticate the data, `NotesError::Crypto` for anything else.
    pub fn decrypt(&self, encrypted_data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
        let decryptor = age::Decryptor::new(encrypted_data)
            .map_err(|e| NotesError::Crypto(format!("Failed to create decryptor: {}", e)))?;

        let mut identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_string()));
        if let Some(cap) = self.max_decrypt_work_factor() {
            identity.set_max_work_factor(cap);
        }
        let mut reader = decryptor
            .decrypt(iter::once(&identity as &dyn age::Identity))
            .map_err(|e| match e {
                age::DecryptError::NoMatchingKeys
                | age::DecryptError::DecryptionFailed
                | age::DecryptError::KeyDecryptionFailed => NotesError::IncorrectPassphrase,
                _ => NotesError::Crypto(format!("Decryption failed: {}", e)),
            })?;

        let mut decrypted = Vec::new();
        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| NotesError::Crypto(format!("Failed to read decrypted data: {}", e)))?;

        Ok(decrypted)
    }

    /// Encrypt a UTF-8 string into a base64 ciphertext string.
    pub fn encrypt_str(&self, plaintext: &str, passphrase: &str) -> Result<String> {
        let encrypted = self.encrypt(plaintext.as_bytes(), passphrase)?;
        Ok(STANDARD.encode(encrypted))
    }

    /// Decrypt a ciphertext string produced by [`Cipher::encrypt_str`].
    pub fn decrypt_str(&self, ciphertext: &str, passphrase: &str) -> Result<String> {
        let encrypted = STANDARD
            .decode(ciphertext.trim().as_bytes())
            .map_err(|e| NotesError::Crypto(format!("Ciphertext is not base64: {}", e)))?;
        let decrypted = self.decrypt(&encrypted, passphrase)?;
        String::from_utf8(decrypted)
            .map_err(|_| NotesError::Crypto("Decrypted data is not valid UTF-8".to_string()))
    }
}
