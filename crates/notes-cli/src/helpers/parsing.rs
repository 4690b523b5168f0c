//! Note ID parsing.

use uuid::Uuid;

use notes_core::NoteSync;

use crate::errors::CliError;

const LIST_HINT: &str = "Hint: Run `notes list` to find note IDs.";

/// Resolve a full UUID or a unique prefix of one to a cached note id.
pub fn resolve_note_id(notes: &NoteSync, input: &str) -> anyhow::Result<Uuid> {
    let needle = input.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Err(CliError::invalid_input("Note ID cannot be empty").into());
    }

    if let Ok(id) = Uuid::parse_str(&needle) {
        if notes.get(&id).is_some() {
            return Ok(id);
        }
        return Err(CliError::not_found(format!("Note {} not found", id), LIST_HINT).into());
    }

    let matches: Vec<Uuid> = notes
        .list()
        .iter()
        .map(|note| note.id)
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::not_found(format!("No note matches '{}'", input), LIST_HINT).into()),
        _ => Err(CliError::invalid_input(format!(
            "Note ID prefix '{}' is ambiguous ({} matches)",
            input,
            matches.len()
        ))
        .into()),
    }
}
