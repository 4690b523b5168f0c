//! In-process remote store.
//!
//! Holds the whole namespace as one JSON tree. Used by tests and by front
//! ends that want a throwaway backend.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{NotesError, Result};
use crate::storage::remote::{RemoteStore, Snapshot};
use crate::storage::tree;

/// Remote store backed by an in-memory JSON tree.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    root: Mutex<Value>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the whole namespace.
    pub fn dump(&self) -> Result<Value> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Value>> {
        self.root
            .lock()
            .map_err(|_| NotesError::Network("Memory remote poisoned".to_string()))
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn read(&self, path: &str) -> Result<Snapshot> {
        let segments = tree::segments(path)?;
        let root = self.lock()?;
        Ok(Snapshot::new(tree::get(&root, &segments).cloned()))
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        let segments = tree::segments(path)?;
        let mut root = self.lock()?;
        tree::set(&mut root, &segments, value);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let segments = tree::segments(path)?;
        let mut root = self.lock()?;
        tree::remove(&mut root, &segments);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_read_delete() {
        let remote = MemoryRemote::new();
        remote
            .write("notes/a:notes:1", json!({"encryptedNote": "x"}))
            .await
            .unwrap();
        remote
            .write("notes/b:notes:2", json!({"encryptedNote": "y"}))
            .await
            .unwrap();

        let snapshot = remote.read("notes").await.unwrap();
        assert!(snapshot.exists());
        assert_eq!(snapshot.value().unwrap().as_object().unwrap().len(), 2);

        remote.delete("notes/a:notes:1").await.unwrap();
        let snapshot = remote.read("notes/a:notes:1").await.unwrap();
        assert!(!snapshot.exists());
    }

    #[tokio::test]
    async fn test_read_missing_path() {
        let remote = MemoryRemote::new();
        assert!(!remote.read("creds/nobody:passphrase").await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_delete_missing_path_is_ok() {
        let remote = MemoryRemote::new();
        assert!(remote.delete("notes/ghost").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_path_rejected() {
        let remote = MemoryRemote::new();
        let err = remote.write("notes/$bad", json!(1)).await.unwrap_err();
        assert!(matches!(err, NotesError::InvalidInput(_)));
    }
}
