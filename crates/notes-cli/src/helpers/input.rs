//! Input handling helpers for passwords and note content.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use dialoguer::{Input, Password};
use notes_core::Document;

use crate::constants::PASSWORD_ENV;
use crate::errors::CliError;

/// Prompt for the login password, or read it from NOTES_PASSWORD.
pub fn prompt_password(interactive: bool) -> anyhow::Result<String> {
    if let Ok(value) = std::env::var(PASSWORD_ENV) {
        if !value.trim().is_empty() {
            return Ok(value);
        }
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No password provided and no TTY available. Set {}.",
            PASSWORD_ENV
        ))
        .into());
    }
    Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Prompt for a username when none was given on the command line.
pub fn prompt_username(interactive: bool) -> anyhow::Result<String> {
    if !interactive {
        return Err(CliError::invalid_input(
            "No username provided and no TTY available. Use --user or set NOTES_USER.",
        )
        .into());
    }
    Input::<String>::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to read username: {}", e))
}

/// Read note content from --text, a JSON document file, or stdin.
pub fn read_note_content(text: Option<String>, file: Option<&Path>) -> anyhow::Result<Document> {
    if let Some(value) = text {
        return Ok(Document::from_plain_text(&value));
    }

    if let Some(path) = file {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let value: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
            CliError::invalid_input(format!("{} is not a JSON document: {}", path.display(), e))
        })?;
        return Ok(Document::from_value(value));
    }

    if io::stdin().is_terminal() {
        return Err(CliError::invalid_input(
            "No content provided. Use --text, --file, or pipe text on stdin.",
        )
        .into());
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
    Ok(Document::from_plain_text(buffer.trim_end()))
}
