//! Path resolution for config and data files.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, NotesConfig};

/// Resolve the config file path: --config / NOTES_CONFIG first, then XDG.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.config.as_ref() {
        if !path.as_os_str().is_empty() {
            return Ok(path.clone());
        }
    }
    default_config_path()
}

/// Load the config file, or defaults when there is none.
pub fn load_config(cli: &Cli) -> anyhow::Result<NotesConfig> {
    let config_path = resolve_config_path(cli)?;
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        return Ok(NotesConfig::default());
    }
    read_config(&config_path)
}
