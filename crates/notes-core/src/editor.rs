//! Editor adapter contract.
//!
//! The synchronization layer never renders anything. It talks to an editor
//! through two operations: load a document for display, and read the current
//! document back. Every change the editor reports becomes an [`EditorUpdate`].

use crate::note::Document;

/// A change reported by an editor: new content plus the title derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorUpdate {
    pub content: Document,
    pub title: Option<String>,
}

impl EditorUpdate {
    pub fn from_document(content: Document) -> Self {
        let title = content.derive_title();
        Self { content, title }
    }
}

/// A rich-text editing surface.
pub trait Editor {
    /// Replace what the editor displays.
    fn load(&mut self, document: &Document);

    /// Current content as a structured document.
    fn document(&self) -> Document;

    /// Current content packaged as an update.
    fn update(&self) -> EditorUpdate {
        EditorUpdate::from_document(self.document())
    }
}

/// Plain-text editor for terminal front ends.
///
/// Text maps to documents via [`Document::from_plain_text`]; documents map
/// back via [`Document::to_plain_text`]. Formatting does not survive a
/// round trip through text.
#[derive(Debug, Clone, Default)]
pub struct TextEditor {
    document: Document,
}

impl TextEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content with `text`, as if typed, and report the change.
    pub fn set_text(&mut self, text: &str) -> EditorUpdate {
        self.document = Document::from_plain_text(text);
        self.update()
    }

    /// Displayed content as plain text.
    pub fn text(&self) -> String {
        self.document.to_plain_text()
    }
}

impl Editor for TextEditor {
    fn load(&mut self, document: &Document) {
        self.document = document.clone();
    }

    fn document(&self) -> Document {
        self.document.clone()
    }
}
