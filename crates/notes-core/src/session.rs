//! Login/logout glue.
//!
//! A [`Session`] is what a front end holds between login and logout: the
//! user's identity and their loaded notes. The local store only remembers
//! which user was last logged in.

use std::sync::Arc;

use crate::config::SyncConfig;
use crate::credentials::{CredentialService, LoginAction, UserData};
use crate::error::Result;
use crate::storage::{LocalStore, RemoteStore};
use crate::sync::{LoadReport, NoteSync};

/// Local key holding the username of the logged-in user.
pub const LAST_USER_KEY: &str = "last_user";

/// A logged-in user and their notes.
#[derive(Debug)]
pub struct Session {
    user: Arc<UserData>,
    notes: NoteSync,
}

impl Session {
    /// Authenticate, load the user's notes and remember the user locally.
    pub async fn login(
        action: &LoginAction,
        remote: Arc<dyn RemoteStore>,
        local: &LocalStore,
        config: &SyncConfig,
    ) -> Result<(Self, LoadReport)> {
        config.validate()?;

        let credentials = CredentialService::new(
            Arc::clone(&remote),
            config.credential_cipher(),
            config.retry,
        );
        let user = Arc::new(credentials.login(action).await?);
        let (notes, report) = NoteSync::load(Arc::clone(&user), remote, config).await?;

        local.set(LAST_USER_KEY, user.username())?;
        Ok((Self { user, notes }, report))
    }

    /// Username of the last user to log in, if they have not logged out.
    pub fn last_user(local: &LocalStore) -> Result<Option<String>> {
        local.get(LAST_USER_KEY)
    }

    pub fn user(&self) -> &UserData {
        &self.user
    }

    pub fn notes(&self) -> &NoteSync {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteSync {
        &mut self.notes
    }

    /// Save pending changes and stop syncing, keeping the user remembered.
    pub async fn close(self) -> Result<()> {
        self.notes.close().await
    }

    /// Save pending changes, stop syncing and forget the user locally.
    ///
    /// The local indicator is removed even when some notes failed to save;
    /// the save failure is still returned.
    pub async fn logout(self, local: &LocalStore) -> Result<()> {
        let closed = self.notes.close().await;
        Self::forget_last_user(local)?;
        closed
    }

    /// Forget the remembered user without an open session.
    ///
    /// Returns the username that was forgotten.
    pub fn forget_last_user(local: &LocalStore) -> Result<Option<String>> {
        let username = local.get(LAST_USER_KEY)?;
        if let Some(username) = &username {
            local.remove(LAST_USER_KEY)?;
            tracing::info!(username = %username, "Logged out");
        }
        Ok(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CipherConfig;
    use crate::error::NotesError;
    use crate::note::Document;
    use crate::retry::RetryPolicy;
    use crate::storage::MemoryRemote;

    fn config() -> SyncConfig {
        SyncConfig {
            save_delay_ms: 20,
            retry: RetryPolicy::none(),
            cipher: CipherConfig {
                work_factor: Some(10),
                ..CipherConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn test_login_remembers_user_and_logout_forgets() {
        let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
        let local = LocalStore::open_in_memory().unwrap();

        let (session, report) = Session::login(
            &LoginAction::password("alice", "pw"),
            remote,
            &local,
            &config(),
        )
        .await
        .unwrap();

        assert!(report.is_clean());
        assert_eq!(session.user().username(), "alice");
        assert_eq!(Session::last_user(&local).unwrap().as_deref(), Some("alice"));

        session.logout(&local).await.unwrap();
        assert_eq!(Session::last_user(&local).unwrap(), None);
    }

    #[tokio::test]
    async fn test_notes_survive_logout_and_login() {
        let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
        let local = LocalStore::open_in_memory().unwrap();
        let action = LoginAction::password("alice", "pw");

        let (mut session, _) = Session::login(&action, Arc::clone(&remote), &local, &config())
            .await
            .unwrap();
        session.notes_mut().create_note();
        session
            .notes_mut()
            .update_active(Document::from_plain_text("Groceries"), Some("Groceries".into()))
            .unwrap();
        session.logout(&local).await.unwrap();

        let (session, _) = Session::login(&action, remote, &local, &config())
            .await
            .unwrap();
        let titles: Vec<&str> = session
            .notes()
            .list()
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Groceries"]);
    }

    #[tokio::test]
    async fn test_wrong_password_does_not_touch_local_store() {
        let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
        let local = LocalStore::open_in_memory().unwrap();

        let (session, _) = Session::login(
            &LoginAction::password("alice", "pw"),
            Arc::clone(&remote),
            &local,
            &config(),
        )
        .await
        .unwrap();
        session.logout(&local).await.unwrap();

        let err = Session::login(
            &LoginAction::password("alice", "nope"),
            remote,
            &local,
            &config(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NotesError::Auth(_)));
        assert_eq!(Session::last_user(&local).unwrap(), None);
    }

    #[tokio::test]
    async fn test_forget_last_user_without_session() {
        let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
        let local = LocalStore::open_in_memory().unwrap();

        assert_eq!(Session::forget_last_user(&local).unwrap(), None);

        let (session, _) = Session::login(
            &LoginAction::password("alice", "pw"),
            remote,
            &local,
            &config(),
        )
        .await
        .unwrap();
        session.close().await.unwrap();

        assert_eq!(
            Session::forget_last_user(&local).unwrap().as_deref(),
            Some("alice")
        );
        assert_eq!(Session::last_user(&local).unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
        let local = LocalStore::open_in_memory().unwrap();
        let mut config = config();
        config.retry.max_attempts = 0;

        let err = Session::login(&LoginAction::password("alice", "pw"), remote, &local, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::Config(_)));
    }
}
