//! Remote store interface.
//!
//! The remote store is a path-addressed JSON tree with no query primitive:
//! callers read a whole subtree and filter client-side. Implementations must
//! report transport or backend failures as `NotesError::Network` so callers
//! can retry them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Result of reading a path: the full subtree, if anything is stored there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    value: Option<Value>,
}

impl Snapshot {
    pub fn new(value: Option<Value>) -> Self {
        Self {
            value: value.filter(|v| !v.is_null()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}

/// Remote key-value store interface.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the subtree stored at `path`.
    async fn read(&self, path: &str) -> Result<Snapshot>;

    /// Replace whatever is stored at `path` with `value`.
    async fn write(&self, path: &str, value: Value) -> Result<()>;

    /// Remove `path` and everything below it. Removing a missing path is not an error.
    async fn delete(&self, path: &str) -> Result<()>;
}
