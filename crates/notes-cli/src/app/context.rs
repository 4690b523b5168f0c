//! Application context for the Notes CLI.
//!
//! Provides a unified context that combines CLI arguments with
//! lazily-loaded configuration.

use std::io::IsTerminal;
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use notes_core::{LocalStore, LoginAction, RemoteStore, Session, SqliteRemote};

use crate::cli::Cli;
use crate::config::NotesConfig;
use crate::errors::CliError;
use crate::helpers::prompt_password;
use crate::output::print_load_report;

use super::resolver::load_config;

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<NotesConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Whether prompts can be shown.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    /// Username given with --user or NOTES_USER.
    pub fn user_flag(&self) -> Option<&str> {
        self.cli
            .user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Get the configuration, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&NotesConfig> {
        self.config.get_or_try_init(|| load_config(self.cli))
    }

    pub fn open_local(&self) -> anyhow::Result<LocalStore> {
        let path = self.config()?.local_path()?;
        Ok(LocalStore::open(&path)?)
    }

    pub fn open_remote(&self) -> anyhow::Result<Arc<dyn RemoteStore>> {
        let path = self.config()?.remote_path()?;
        Ok(Arc::new(SqliteRemote::open(&path)?))
    }

    /// Log in with `action`, print any load failures, and return the session.
    pub async fn login(
        &self,
        action: &LoginAction,
        local: &LocalStore,
    ) -> anyhow::Result<Session> {
        let remote = self.open_remote()?;
        let (session, report) =
            Session::login(action, remote, local, &self.config()?.sync).await?;
        if !self.quiet() {
            print_load_report(&report);
        }
        Ok(session)
    }

    /// Open a session for the selected user, prompting for the password.
    pub async fn open_session(&self) -> anyhow::Result<(Session, LocalStore)> {
        let local = self.open_local()?;
        let username = match self.user_flag() {
            Some(user) => user.to_string(),
            None => Session::last_user(&local)?.ok_or_else(|| {
                CliError::not_found("No user logged in", "Hint: Run `notes login` first.")
            })?,
        };
        let password = prompt_password(self.interactive())?;

        let session = self
            .login(&LoginAction::password(username, password), &local)
            .await?;
        Ok((session, local))
    }

    /// Write pending changes and fail if any note could not be saved.
    pub async fn finish(&self, session: Session) -> anyhow::Result<()> {
        session.notes().flush().await;
        let failed = session.notes().failed_saves();
        if let Some((id, reason)) = failed.first() {
            return Err(CliError::sync_failed(format!(
                "{} note(s) could not be saved (first: {}: {})",
                failed.len(),
                id,
                reason
            ))
            .into());
        }
        session.close().await?;
        Ok(())
    }
}
