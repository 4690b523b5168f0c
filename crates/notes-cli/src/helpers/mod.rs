//! Input and parsing helper functions for the CLI.
//!
//! This module provides utilities for:
//! - Password prompting and note content reading (`input`)
//! - Note ID resolution (`parsing`)

mod input;
mod parsing;

// Re-export public API
pub use input::{prompt_password, prompt_username, read_note_content};
pub use parsing::resolve_note_id;
