//! Note model and structured documents.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Title used when a note has no derivable title.
pub const DEFAULT_TITLE: &str = "New note";

/// Rich-text document: a tree of typed nodes.
///
/// The core treats documents as opaque JSON and only looks inside to derive
/// titles and plain text. Any JSON value round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Value);

impl Document {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Content of a freshly created note: a single empty level-1 heading.
    pub fn placeholder() -> Self {
        Self(json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 1 } }
            ]
        }))
    }

    /// Build a document from plain text: the first line becomes a level-1
    /// heading, every following line a paragraph.
    pub fn from_plain_text(text: &str) -> Self {
        let mut blocks = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let inline: Vec<Value> = if line.is_empty() {
                Vec::new()
            } else {
                vec![json!({ "type": "text", "text": line })]
            };
            let mut block = if index == 0 {
                json!({ "type": "heading", "attrs": { "level": 1 } })
            } else {
                json!({ "type": "paragraph" })
            };
            if !inline.is_empty() {
                block["content"] = Value::Array(inline);
            }
            blocks.push(block);
        }
        if blocks.is_empty() {
            return Self::placeholder();
        }
        Self(json!({ "type": "doc", "content": blocks }))
    }

    /// Top-level blocks of the document.
    fn blocks(&self) -> &[Value] {
        self.0
            .get("content")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Plain text of the first top-level block, trimmed; `None` when blank.
    pub fn derive_title(&self) -> Option<String> {
        let text = match &self.0 {
            Value::String(raw) => raw.lines().next().unwrap_or_default().to_string(),
            _ => self.blocks().first().map(node_text).unwrap_or_default(),
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Plain text of the whole document, one line per top-level block.
    pub fn to_plain_text(&self) -> String {
        match &self.0 {
            Value::String(raw) => raw.clone(),
            _ => self
                .blocks()
                .iter()
                .map(node_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::placeholder()
    }
}

fn node_text(node: &Value) -> String {
    match node.get("type").and_then(Value::as_str) {
        Some("text") => node
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some("hardBreak") => "\n".to_string(),
        _ => {
            let children = node
                .get("content")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let inline = children
                .iter()
                .all(|child| matches!(child.get("type").and_then(Value::as_str), Some("text" | "hardBreak")));
            let separator = if inline { "" } else { "\n\n" };
            children
                .iter()
                .map(node_text)
                .collect::<Vec<_>>()
                .join(separator)
        }
    }
}

/// A note as held in the session cache and serialized before encryption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: Document,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// A new note with placeholder title and content.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_TITLE.to_string(),
            content: Document::placeholder(),
            updated_at: Utc::now(),
        }
    }

    /// Replace content and title and move `updated_at` strictly forward.
    pub fn apply(&mut self, content: Document, title: Option<String>) {
        self.content = content;
        self.title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        self.updated_at = next_timestamp(self.updated_at);
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
