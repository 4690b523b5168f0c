//! Output formatting helpers for the CLI.
//!
//! This module provides formatting utilities for displaying notes
//! in various formats (JSON, table, plain text).

mod json;
mod text;

// Re-export public API
pub use json::{note_json, notes_json};
pub use text::{print_load_report, print_note, print_note_list};
