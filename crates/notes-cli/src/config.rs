use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use notes_core::SyncConfig;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NotesConfig {
    #[serde(default)]
    pub remote: StoreSection,
    #[serde(default)]
    pub local: StoreSection,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

impl NotesConfig {
    /// Remote store database, falling back to the XDG data dir.
    pub fn remote_path(&self) -> anyhow::Result<PathBuf> {
        match &self.remote.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(xdg_data_dir()?.join("remote.db")),
        }
    }

    /// Local session store database, falling back to the XDG data dir.
    pub fn local_path(&self) -> anyhow::Result<PathBuf> {
        match &self.local.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(xdg_data_dir()?.join("local.db")),
        }
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn read_config(path: &Path) -> anyhow::Result<NotesConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: NotesConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
    config.sync.validate()?;
    Ok(config)
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("notes"));
        }
    }
    Ok(home_dir()?.join(".config").join("notes"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("notes"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("notes"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: NotesConfig = toml::from_str(
            r#"
            [remote]
            path = "/tmp/remote.db"

            [local]
            path = "/tmp/local.db"

            [sync]
            save_delay_ms = 500

            [sync.retry]
            max_attempts = 5

            [sync.cipher]
            work_factor = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.remote_path().unwrap(), PathBuf::from("/tmp/remote.db"));
        assert_eq!(config.local_path().unwrap(), PathBuf::from("/tmp/local.db"));
        assert_eq!(config.sync.save_delay_ms, 500);
        assert_eq!(config.sync.retry.max_attempts, 5);
        assert_eq!(config.sync.retry.initial_backoff_ms, 100);
        assert_eq!(config.sync.cipher.work_factor, Some(12));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: NotesConfig = toml::from_str("").unwrap();
        assert!(config.remote.path.is_none());
        assert_eq!(config.sync, SyncConfig::default());
    }
}
