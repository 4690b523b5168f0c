//! Note synchronization layer.
//!
//! [`NoteSync`] owns the session's note cache. The cache is authoritative for
//! the session: reads never touch the remote store after [`NoteSync::load`],
//! and every mutation is written through asynchronously.
//!
//! Writes are debounced per note. Each note gets its own [`Debounced`] saver,
//! so a burst of edits to one note collapses into a single encrypted write
//! while edits to different notes never delay each other.
//!
//! There is no optimistic concurrency: two sessions writing the same note
//! overwrite each other and the last write wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::SyncConfig;
use crate::credentials::UserData;
use crate::crypto::Cipher;
use crate::debounce::Debounced;
use crate::editor::EditorUpdate;
use crate::error::{NotesError, Result};
use crate::note::{Document, Note};
use crate::retry::RetryPolicy;
use crate::storage::keys::{self, NoteKey, NoteRecord, NOTES_ROOT};
use crate::storage::RemoteStore;

/// Persistence state of a single note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    /// A change is waiting to be written (or is being written).
    Pending,
    /// The latest change is on the remote store.
    Saved,
    /// The latest write failed.
    Failed(String),
}

/// Why a stored record was skipped during load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The cipher rejected the ciphertext under the session passphrase.
    DecryptFailed,
    /// Key, record shape, or note JSON did not parse.
    Malformed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::DecryptFailed => write!(f, "decrypt failed"),
            FailureKind::Malformed => write!(f, "malformed"),
        }
    }
}

/// A record belonging to the session user that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub key: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Outcome of [`NoteSync::load`] beyond the notes themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub failures: Vec<RecordFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, key: &str, kind: FailureKind, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(key, %kind, reason = %reason, "Skipping unreadable note record");
        self.failures.push(RecordFailure {
            key: key.to_string(),
            kind,
            reason,
        });
    }
}

/// Handle to a remote delete started by [`NoteSync::delete_note`].
///
/// Dropping the handle does not cancel the delete.
#[derive(Debug)]
pub struct PendingDelete {
    handle: JoinHandle<Result<()>>,
}

impl PendingDelete {
    /// Wait for the remote record to be gone.
    pub async fn wait(self) -> Result<()> {
        self.handle.await?
    }
}

#[derive(Debug, Clone)]
struct SaveEntry {
    state: SaveState,
    revision: u64,
}

type StatusMap = Arc<Mutex<HashMap<Uuid, SaveEntry>>>;

/// Everything a background save needs. Cloned into each saver.
#[derive(Clone)]
struct Persister {
    user: Arc<UserData>,
    remote: Arc<dyn RemoteStore>,
    cipher: Cipher,
    retry: RetryPolicy,
    status: StatusMap,
}

impl Persister {
    fn status(&self) -> MutexGuard<'_, HashMap<Uuid, SaveEntry>> {
        // Entries are always replaced whole, so a poisoned map is still consistent
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark `id` as changed and return the revision to save.
    fn mark_pending(&self, id: Uuid) -> u64 {
        let mut status = self.status();
        let entry = status.entry(id).or_insert(SaveEntry {
            state: SaveState::Pending,
            revision: 0,
        });
        entry.revision += 1;
        entry.state = SaveState::Pending;
        entry.revision
    }

    async fn persist(&self, note: Note, revision: u64) {
        let id = note.id;
        let result = self.write(note).await;

        let mut status = self.status();
        // A newer revision is queued or the note was deleted meanwhile
        let Some(entry) = status.get_mut(&id).filter(|e| e.revision == revision) else {
            return;
        };
        entry.state = match result {
            Ok(()) => {
                tracing::debug!(note_id = %id, "Note saved");
                SaveState::Saved
            }
            Err(err) => {
                tracing::error!(note_id = %id, error = %err, "Failed to save note");
                SaveState::Failed(err.to_string())
            }
        };
    }

    async fn write(&self, note: Note) -> Result<()> {
        let path = keys::note_path(self.user.username(), &note.id);
        let plaintext = Zeroizing::new(serde_json::to_string(&note)?);

        let user = Arc::clone(&self.user);
        let cipher = self.cipher;
        let encrypted_note =
            tokio::task::spawn_blocking(move || cipher.encrypt_str(&plaintext, user.passphrase()))
                .await??;

        let record = serde_json::to_value(NoteRecord { encrypted_note })?;
        self.retry
            .run("write note", || self.remote.write(&path, record.clone()))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let path = keys::note_path(self.user.username(), &id);
        self.retry
            .run("delete note", || self.remote.delete(&path))
            .await?;
        tracing::info!(note_id = %id, "Note deleted");
        Ok(())
    }
}

/// In-memory note cache with debounced, encrypted write-through.
///
/// Must be used inside a tokio runtime.
pub struct NoteSync {
    notes: HashMap<Uuid, Note>,
    active: Option<Uuid>,
    savers: HashMap<Uuid, Debounced<(Note, u64)>>,
    save_delay: Duration,
    persister: Persister,
}

impl std::fmt::Debug for NoteSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteSync")
            .field("user", &self.persister.user.username())
            .field("notes", &self.notes.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl NoteSync {
    /// Load and decrypt every note belonging to `user`.
    ///
    /// Records of other users are ignored. Records of `user` that cannot be
    /// decrypted or parsed are left out of the cache and listed in the
    /// returned [`LoadReport`].
    pub async fn load(
        user: Arc<UserData>,
        remote: Arc<dyn RemoteStore>,
        config: &SyncConfig,
    ) -> Result<(Self, LoadReport)> {
        let snapshot = config
            .retry
            .run("read notes", || remote.read(NOTES_ROOT))
            .await?;

        let mut report = LoadReport::default();
        let mut candidates = Vec::new();

        match snapshot.into_value() {
            None => {}
            Some(Value::Object(records)) => {
                for (key, value) in records {
                    if NoteKey::username_of(&key) != user.username() {
                        continue;
                    }
                    let note_id = match NoteKey::parse(&key) {
                        Ok(parsed) => parsed.note_id,
                        Err(err) => {
                            report.record(&key, FailureKind::Malformed, err.to_string());
                            continue;
                        }
                    };
                    match serde_json::from_value::<NoteRecord>(value) {
                        Ok(record) => candidates.push((key, note_id, record.encrypted_note)),
                        Err(err) => report.record(&key, FailureKind::Malformed, err.to_string()),
                    }
                }
            }
            Some(_) => {
                return Err(NotesError::Decode {
                    key: NOTES_ROOT.to_string(),
                    reason: "expected an object of note records".to_string(),
                });
            }
        }

        let cipher = config.note_cipher();
        let decrypt_user = Arc::clone(&user);
        let decrypted = tokio::task::spawn_blocking(move || {
            candidates
                .into_iter()
                .map(|(key, id, ciphertext)| {
                    let plaintext = cipher
                        .decrypt_str(&ciphertext, decrypt_user.passphrase())
                        .map(Zeroizing::new);
                    (key, id, plaintext)
                })
                .collect::<Vec<_>>()
        })
        .await?;

        let mut notes = HashMap::new();
        for (key, id, plaintext) in decrypted {
            let plaintext = match plaintext {
                Ok(plaintext) => plaintext,
                Err(err) => {
                    report.record(&key, FailureKind::DecryptFailed, err.to_string());
                    continue;
                }
            };
            match serde_json::from_str::<Note>(&plaintext) {
                Ok(note) if note.id == id => {
                    notes.insert(id, note);
                }
                Ok(note) => report.record(
                    &key,
                    FailureKind::Malformed,
                    format!("record holds note {}", note.id),
                ),
                Err(err) => report.record(&key, FailureKind::Malformed, err.to_string()),
            }
        }

        tracing::debug!(
            username = user.username(),
            notes = notes.len(),
            failures = report.failures.len(),
            "Loaded notes"
        );

        let sync = Self {
            notes,
            active: None,
            savers: HashMap::new(),
            save_delay: config.save_delay(),
            persister: Persister {
                user,
                remote,
                cipher,
                retry: config.retry,
                status: Arc::new(Mutex::new(HashMap::new())),
            },
        };
        Ok((sync, report))
    }

    pub fn user(&self) -> &UserData {
        &self.persister.user
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes ordered by `updated_at` descending, ties by id.
    pub fn list(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.values().collect();
        notes.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        notes
    }

    pub fn get(&self, id: &Uuid) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn active(&self) -> Option<&Note> {
        self.active.and_then(|id| self.notes.get(&id))
    }

    pub fn set_active(&mut self, id: Uuid) -> Result<()> {
        if !self.notes.contains_key(&id) {
            return Err(NotesError::NotFound(format!("Note {}", id)));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Create a note with placeholder content, make it active and schedule its save.
    pub fn create_note(&mut self) -> &Note {
        let note = Note::new();
        let id = note.id;
        tracing::info!(note_id = %id, "Created note");

        self.schedule(note.clone());
        self.active = Some(id);
        self.notes.entry(id).or_insert(note)
    }

    /// Replace the active note's content and title and schedule its save.
    ///
    /// A missing or blank `title` falls back to [`crate::DEFAULT_TITLE`].
    pub fn update_active(&mut self, content: Document, title: Option<String>) -> Result<&Note> {
        let id = self
            .active
            .ok_or_else(|| NotesError::NotFound("No active note".to_string()))?;
        let note = self
            .notes
            .get_mut(&id)
            .ok_or_else(|| NotesError::NotFound(format!("Note {}", id)))?;

        note.apply(content, title);
        let snapshot = note.clone();
        self.schedule(snapshot);

        self.notes
            .get(&id)
            .ok_or_else(|| NotesError::NotFound(format!("Note {}", id)))
    }

    /// Apply a change reported by the editor to the active note.
    pub fn apply(&mut self, update: EditorUpdate) -> Result<&Note> {
        self.update_active(update.content, update.title)
    }

    /// Remove a note from the cache now and from the remote store in the background.
    ///
    /// Any pending save for the note is discarded, and an in-flight save
    /// finishes before the remote delete is issued, so a stale save can never
    /// resurrect the record.
    pub fn delete_note(&mut self, id: Uuid) -> Result<PendingDelete> {
        if self.notes.remove(&id).is_none() {
            return Err(NotesError::NotFound(format!("Note {}", id)));
        }
        if self.active == Some(id) {
            self.active = None;
        }

        let saver = self.savers.remove(&id);
        let persister = self.persister.clone();
        persister.status().remove(&id);

        let handle = tokio::spawn(async move {
            if let Some(saver) = saver {
                saver.cancel().await;
            }
            persister.status().remove(&id);
            persister.delete(id).await
        });
        Ok(PendingDelete { handle })
    }

    /// Write every pending change now and wait for the writes to finish.
    pub async fn flush(&self) {
        for saver in self.savers.values() {
            saver.flush().await;
        }
    }

    /// Flush pending changes and stop all savers.
    ///
    /// Fails if any note could not be saved.
    pub async fn close(self) -> Result<()> {
        self.flush().await;
        let failed = self.failed_saves();

        for (_, saver) in self.savers {
            saver.cancel().await;
        }

        if failed.is_empty() {
            return Ok(());
        }
        Err(NotesError::Other(format!(
            "{} note(s) could not be saved",
            failed.len()
        )))
    }

    pub fn save_state(&self, id: &Uuid) -> Option<SaveState> {
        self.persister.status().get(id).map(|e| e.state.clone())
    }

    /// True while any note has a pending or failed save.
    pub fn has_unsaved_changes(&self) -> bool {
        self.persister
            .status()
            .values()
            .any(|e| e.state != SaveState::Saved)
    }

    pub fn failed_saves(&self) -> Vec<(Uuid, String)> {
        let mut failed: Vec<(Uuid, String)> = self
            .persister
            .status()
            .iter()
            .filter_map(|(id, entry)| match &entry.state {
                SaveState::Failed(reason) => Some((*id, reason.clone())),
                _ => None,
            })
            .collect();
        failed.sort();
        failed
    }

    fn schedule(&mut self, note: Note) {
        let id = note.id;
        let revision = self.persister.mark_pending(id);

        let persister = self.persister.clone();
        let delay = self.save_delay;
        let saver = self.savers.entry(id).or_insert_with(|| {
            Debounced::new(delay, move |(note, revision): (Note, u64)| {
                let persister = persister.clone();
                async move { persister.persist(note, revision).await }
            })
        });
        saver.call((note, revision));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::config::CipherConfig;
    use crate::storage::{MemoryRemote, Snapshot};

    #[derive(Default)]
    struct CountingRemote {
        inner: MemoryRemote,
        writes: AtomicUsize,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl RemoteStore for CountingRemote {
        async fn read(&self, path: &str) -> Result<Snapshot> {
            self.inner.read(path).await
        }

        async fn write(&self, path: &str, value: Value) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(NotesError::Network("unreachable".to_string()));
            }
            self.inner.write(path, value).await
        }

        async fn delete(&self, path: &str) -> Result<()> {
            self.inner.delete(path).await
        }
    }

    fn config() -> SyncConfig {
        SyncConfig {
            save_delay_ms: 50,
            retry: RetryPolicy::none(),
            cipher: CipherConfig {
                work_factor: Some(10),
                ..CipherConfig::default()
            },
        }
    }

    fn user(name: &str) -> Arc<UserData> {
        Arc::new(UserData::new(name, format!("{}-passphrase", name)))
    }

    async fn open(remote: Arc<CountingRemote>) -> NoteSync {
        crate::logging::init_test_logging();
        let (sync, report) = NoteSync::load(user("alice"), remote, &config())
            .await
            .unwrap();
        assert!(report.is_clean());
        sync
    }

    #[tokio::test]
    async fn test_create_note_is_active_with_placeholder() {
        let remote = Arc::new(CountingRemote::default());
        let mut sync = open(remote).await;

        let id = sync.create_note().id;

        let active = sync.active().unwrap();
        assert_eq!(active.id, id);
        assert_eq!(active.title, crate::DEFAULT_TITLE);
        assert_eq!(active.content, Document::placeholder());
        assert_eq!(sync.save_state(&id), Some(SaveState::Pending));
    }

    #[tokio::test]
    async fn test_rapid_updates_collapse_into_one_write() {
        let remote = Arc::new(CountingRemote::default());
        let mut sync = open(remote.clone()).await;

        sync.create_note();
        for text in ["H", "He", "Hel", "Hell", "Hello"] {
            sync.apply(EditorUpdate::from_document(Document::from_plain_text(text)))
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(remote.writes.load(Ordering::SeqCst), 1);
        assert!(!sync.has_unsaved_changes());

        let (reloaded, _) = NoteSync::load(user("alice"), remote, &config())
            .await
            .unwrap();
        assert_eq!(reloaded.list()[0].title, "Hello");
    }

    #[tokio::test]
    async fn test_update_without_active_note() {
        let remote = Arc::new(CountingRemote::default());
        let mut sync = open(remote).await;

        let err = sync
            .update_active(Document::placeholder(), None)
            .unwrap_err();
        assert!(matches!(err, NotesError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let remote = Arc::new(CountingRemote::default());
        let mut sync = open(remote).await;

        let first = sync.create_note().id;
        let second = sync.create_note().id;
        sync.set_active(first).unwrap();
        sync.update_active(Document::from_plain_text("Edited"), Some("Edited".into()))
            .unwrap();

        let order: Vec<Uuid> = sync.list().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![first, second]);
        sync.flush().await;
    }

    #[tokio::test]
    async fn test_delete_discards_pending_save() {
        let remote = Arc::new(CountingRemote::default());
        let mut sync = open(remote.clone()).await;

        let id = sync.create_note().id;
        let pending = sync.delete_note(id).unwrap();

        assert!(sync.get(&id).is_none());
        assert!(sync.active().is_none());
        pending.wait().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(remote.writes.load(Ordering::SeqCst), 0);
        assert!(!remote.inner.read(NOTES_ROOT).await.unwrap().exists());
        assert_eq!(sync.save_state(&id), None);
    }

    #[tokio::test]
    async fn test_delete_unknown_note() {
        let remote = Arc::new(CountingRemote::default());
        let mut sync = open(remote).await;

        assert!(matches!(
            sync.delete_note(Uuid::new_v4()),
            Err(NotesError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_save_is_reported() {
        let remote = Arc::new(CountingRemote::default());
        remote.fail_writes.store(true, Ordering::SeqCst);
        let mut sync = open(remote).await;

        let id = sync.create_note().id;
        sync.flush().await;

        assert!(matches!(sync.save_state(&id), Some(SaveState::Failed(_))));
        assert!(sync.has_unsaved_changes());
        assert_eq!(sync.failed_saves().len(), 1);
        assert!(sync.close().await.is_err());
    }

    #[tokio::test]
    async fn test_load_reports_bad_records_and_skips_other_users() {
        let remote = Arc::new(CountingRemote::default());
        let cipher = config().note_cipher();
        let alice = user("alice");

        // Bob's note is not ours, whatever its shape
        remote
            .inner
            .write(
                &keys::note_path("bob", &Uuid::new_v4()),
                json!({ "encryptedNote": "garbage" }),
            )
            .await
            .unwrap();
        // Encrypted under a different passphrase
        let foreign = cipher.encrypt_str("{}", "wrong").unwrap();
        remote
            .inner
            .write(
                &keys::note_path("alice", &Uuid::new_v4()),
                json!({ "encryptedNote": foreign }),
            )
            .await
            .unwrap();
        // Wrong record shape
        remote
            .inner
            .write(
                &keys::note_path("alice", &Uuid::new_v4()),
                json!({ "other": 1 }),
            )
            .await
            .unwrap();
        // Id in the key does not match the note
        let note = Note::new();
        let ciphertext = cipher
            .encrypt_str(&serde_json::to_string(&note).unwrap(), alice.passphrase())
            .unwrap();
        remote
            .inner
            .write(
                &keys::note_path("alice", &Uuid::new_v4()),
                json!({ "encryptedNote": ciphertext }),
            )
            .await
            .unwrap();

        let (sync, report) = NoteSync::load(alice, remote, &config()).await.unwrap();

        assert!(sync.is_empty());
        assert_eq!(report.failures.len(), 3);
        let decrypt_failures = report
            .failures
            .iter()
            .filter(|f| f.kind == FailureKind::DecryptFailed)
            .count();
        assert_eq!(decrypt_failures, 1);
        assert!(report.failures.iter().all(|f| f.key.starts_with("alice:")));
    }
}
