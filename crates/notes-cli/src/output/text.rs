//! Text and table output formatting for notes.

use std::io::IsTerminal;

use comfy_table::{presets, ContentArrangement, Table};

use notes_core::{LoadReport, Note};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Print notes as a table on a terminal, or one tab-separated line each otherwise.
pub fn print_note_list(notes: &[&Note], quiet: bool) {
    if notes.is_empty() {
        if !quiet {
            println!("No notes yet. Create one with `notes new`.");
        }
        return;
    }

    if !std::io::stdout().is_terminal() {
        for note in notes {
            println!(
                "{}\t{}\t{}",
                note.id,
                note.updated_at.format(TIME_FORMAT),
                note.title
            );
        }
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "UPDATED", "TITLE"]);
    for note in notes {
        let id = note.id.to_string();
        table.add_row(vec![
            id[..8].to_string(),
            note.updated_at.format(TIME_FORMAT).to_string(),
            note.title.clone(),
        ]);
    }
    println!("{}", table);
}

/// Print a single note in human-readable format.
pub fn print_note(note: &Note, quiet: bool) {
    if !quiet {
        println!("ID: {}", note.id);
        println!("Title: {}", note.title);
        println!("Updated: {}", note.updated_at.to_rfc3339());
        println!();
    }
    println!("{}", note.content.to_plain_text());
}

/// Warn about stored records that could not be loaded.
pub fn print_load_report(report: &LoadReport) {
    for failure in &report.failures {
        eprintln!(
            "Warning: skipped note record {} ({}): {}",
            failure.key, failure.kind, failure.reason
        );
    }
}
