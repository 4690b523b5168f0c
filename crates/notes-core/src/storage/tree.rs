//! Path addressing over a JSON tree.
//!
//! Remote stores are addressed like `notes/alice:notes:<id>`: `/` separates
//! segments, each segment is an object key. Both remote adapters share these
//! helpers so they agree on what a path means.

use serde_json::{Map, Value};

use crate::error::{NotesError, Result};

const FORBIDDEN: [char; 4] = ['#', '$', '[', ']'];

/// Split and validate a store path. The empty path (or `/`) addresses the root.
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    for part in &parts {
        if part.is_empty() {
            return Err(NotesError::InvalidInput(format!(
                "Path contains an empty segment: {}",
                path
            )));
        }
        if part.chars().any(|c| FORBIDDEN.contains(&c) || c.is_control()) {
            return Err(NotesError::InvalidInput(format!(
                "Path segment contains a forbidden character: {}",
                part
            )));
        }
    }
    Ok(parts)
}

/// Value stored at `segments`, if any.
pub fn get<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = current.as_object()?.get(*segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Store `value` at `segments`, creating (or replacing non-object) parents.
pub fn set(root: &mut Value, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for segment in parents {
        current = object_mut(current)
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object_mut(current).insert((*last).to_string(), value);
}

/// Remove the value at `segments`, pruning parents left empty.
///
/// Returns whether anything was removed.
pub fn remove(root: &mut Value, segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        let existed = !root.is_null();
        *root = Value::Null;
        return existed;
    };

    let Some(map) = root.as_object_mut() else {
        return false;
    };

    if rest.is_empty() {
        return map.remove(*first).is_some();
    }

    match map.get_mut(*first) {
        Some(child) => {
            let removed = remove(child, rest);
            if is_empty(child) {
                map.remove(*first);
            }
            removed
        }
        None => false,
    }
}

/// True for `null` and for objects with no keys.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}
