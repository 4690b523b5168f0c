//! Credential protocol: login password -> per-user session passphrase.
//!
//! Every user owns a random passphrase that encrypts their notes. The remote
//! credential table stores that passphrase only as ciphertext under the
//! user's login password:
//!
//! - unknown username: generate a passphrase, store its ciphertext, log in
//! - known username: decrypt the stored ciphertext with the supplied password
//!
//! The cipher is authenticated, so a wrong password is an `Auth` error and
//! never a silently wrong passphrase.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

use crate::crypto::{generate_passphrase, validate_password, Cipher};
use crate::error::{NotesError, Result};
use crate::retry::RetryPolicy;
use crate::storage::keys::{self, CredentialRecord};
use crate::storage::RemoteStore;

/// Identity of a logged-in user. Held in memory for the session only.
#[derive(Debug)]
pub struct UserData {
    username: String,
    passphrase: SecretString,
}

impl UserData {
    pub fn new(username: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            passphrase: SecretString::from(passphrase.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The session passphrase.
    ///
    /// # Security
    ///
    /// Use only for immediate encryption operations; never store or log it.
    pub fn passphrase(&self) -> &str {
        self.passphrase.expose_secret()
    }
}

/// An identity already verified by an external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    /// Verified email address; its local part becomes the username.
    pub email: String,
    /// Provider-issued stable subject id; used as the key for the credential record.
    pub subject: String,
}

impl FederatedIdentity {
    pub fn username(&self) -> Result<&str> {
        let local = self.email.split('@').next().unwrap_or_default();
        if local.trim().is_empty() {
            return Err(NotesError::InvalidInput(format!(
                "Email has no local part: {}",
                self.email
            )));
        }
        Ok(local)
    }
}

/// How a user is trying to log in.
#[derive(Debug)]
pub enum LoginAction {
    Password {
        username: String,
        password: SecretString,
    },
    Federated(FederatedIdentity),
}

impl LoginAction {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        LoginAction::Password {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Username this action logs in as.
    pub fn username(&self) -> Result<&str> {
        match self {
            LoginAction::Password { username, .. } => Ok(username),
            LoginAction::Federated(identity) => identity.username(),
        }
    }
}

/// Derives session passphrases from login credentials.
pub struct CredentialService {
    remote: Arc<dyn RemoteStore>,
    cipher: Cipher,
    retry: RetryPolicy,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("cipher", &self.cipher)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl CredentialService {
    pub fn new(remote: Arc<dyn RemoteStore>, cipher: Cipher, retry: RetryPolicy) -> Self {
        Self {
            remote,
            cipher,
            retry,
        }
    }

    /// Run a login action.
    pub async fn login(&self, action: &LoginAction) -> Result<UserData> {
        match action {
            LoginAction::Password { username, password } => {
                self.derive_passphrase(username, password.expose_secret())
                    .await
            }
            LoginAction::Federated(identity) => {
                let username = identity.username()?;
                self.derive_passphrase(username, &identity.subject).await
            }
        }
    }

    /// Resolve the session passphrase for `username`, registering the user
    /// on first sight.
    ///
    /// # Errors
    ///
    /// - `NotesError::Auth` if the user exists and `password` is wrong
    /// - `NotesError::InvalidInput` for an invalid username or blank password
    /// - `NotesError::Decode` if the stored record is malformed
    /// - `NotesError::Network` if the remote store stays unreachable
    pub async fn derive_passphrase(&self, username: &str, password: &str) -> Result<UserData> {
        keys::validate_username(username)?;
        validate_password(password)?;

        let path = keys::credential_path(username);
        let snapshot = self
            .retry
            .run("read credentials", || self.remote.read(&path))
            .await?;

        let Some(value) = snapshot.into_value() else {
            return self.register(username, password, &path).await;
        };

        let record: CredentialRecord =
            serde_json::from_value(value).map_err(|e| NotesError::Decode {
                key: path.clone(),
                reason: e.to_string(),
            })?;

        let cipher = self.cipher;
        let password = Zeroizing::new(password.to_string());
        let decrypted =
            tokio::task::spawn_blocking(move || cipher.decrypt_str(&record.creds, &password))
                .await?;

        let passphrase = match decrypted {
            Ok(passphrase) => Zeroizing::new(passphrase),
            Err(NotesError::IncorrectPassphrase) => {
                tracing::warn!(username, "Rejected login for existing user");
                return Err(NotesError::invalid_credentials());
            }
            Err(err) => return Err(err),
        };

        if passphrase.trim().is_empty() {
            tracing::warn!(username, "Stored passphrase decrypted to nothing");
            return Err(NotesError::invalid_credentials());
        }

        tracing::info!(username, "Logged in");
        Ok(UserData::new(username, passphrase.as_str()))
    }

    async fn register(&self, username: &str, password: &str, path: &str) -> Result<UserData> {
        let passphrase = generate_passphrase();

        let cipher = self.cipher;
        let plaintext = passphrase.clone();
        let password = Zeroizing::new(password.to_string());
        let creds =
            tokio::task::spawn_blocking(move || cipher.encrypt_str(&plaintext, &password))
                .await??;

        let record = serde_json::to_value(CredentialRecord { creds })?;
        self.retry
            .run("write credentials", || self.remote.write(path, record.clone()))
            .await?;

        tracing::info!(username, "Registered new user");
        Ok(UserData::new(username, passphrase.as_str()))
    }
}
