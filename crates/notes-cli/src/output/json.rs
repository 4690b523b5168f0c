//! JSON output formatting for notes.

use notes_core::Note;

/// Convert a note to JSON for output.
pub fn note_json(note: &Note) -> serde_json::Value {
    serde_json::json!({
        "id": note.id,
        "title": note.title,
        "updated_at": note.updated_at,
        "text": note.content.to_plain_text(),
        "content": note.content,
    })
}

/// Convert multiple notes to a JSON array for output, without content.
pub fn notes_json(notes: &[&Note]) -> Vec<serde_json::Value> {
    notes
        .iter()
        .map(|note| {
            serde_json::json!({
                "id": note.id,
                "title": note.title,
                "updated_at": note.updated_at,
            })
        })
        .collect()
}
