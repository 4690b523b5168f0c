use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use notes_core::config::CipherConfig;
use notes_core::retry::RetryPolicy;
use notes_core::storage::Snapshot;
use notes_core::{
    Document, EditorUpdate, LocalStore, LoginAction, MemoryRemote, NotesError, RemoteStore,
    NoteSync, Result, Session, SqliteRemote, SyncConfig, UserData, DEFAULT_TITLE,
};

fn test_config() -> SyncConfig {
    SyncConfig {
        save_delay_ms: 50,
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 5,
            max_backoff_ms: 20,
        },
        cipher: CipherConfig {
            work_factor: Some(10),
            ..CipherConfig::default()
        },
    }
}

/// Remote that fails the first `failures` writes with a network error.
struct FlakyRemote {
    inner: MemoryRemote,
    failures: AtomicUsize,
    writes: AtomicUsize,
}

impl FlakyRemote {
    fn new(failures: usize) -> Self {
        Self {
            inner: MemoryRemote::new(),
            failures: AtomicUsize::new(failures),
            writes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RemoteStore for FlakyRemote {
    async fn read(&self, path: &str) -> Result<Snapshot> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(NotesError::Network("connection reset".to_string()));
        }
        self.inner.write(path, value).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.inner.delete(path).await
    }
}

fn contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Array(items) => items.iter().any(|v| contains_text(v, needle)),
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k.contains(needle) || contains_text(v, needle)),
        _ => false,
    }
}

#[tokio::test]
async fn test_create_edit_delete_reload_scenario() {
    let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
    let local = LocalStore::open_in_memory().expect("open local store");
    let action = LoginAction::password("alice", "correct horse");
    let config = test_config();

    let (mut session, report) = Session::login(&action, Arc::clone(&remote), &local, &config)
        .await
        .expect("first login registers");
    assert!(report.is_clean());
    assert!(session.notes().is_empty());

    let notes = session.notes_mut();
    let created = notes.create_note().clone();
    assert_eq!(created.title, DEFAULT_TITLE);
    assert_eq!(created.content, Document::placeholder());

    let edited = notes
        .apply(EditorUpdate::from_document(Document::from_plain_text(
            "Hello\nfirst body line",
        )))
        .expect("active note")
        .clone();
    assert_eq!(edited.title, "Hello");
    assert!(edited.updated_at > created.updated_at);

    let keep = notes.create_note().id;
    notes.flush().await;

    notes
        .delete_note(created.id)
        .expect("known note")
        .wait()
        .await
        .expect("remote delete");
    assert!(notes.get(&created.id).is_none());
    session.logout(&local).await.expect("logout");

    let (session, report) = Session::login(&action, remote, &local, &config)
        .await
        .expect("second login");
    assert!(report.is_clean());
    let ids: Vec<_> = session.notes().list().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![keep]);
}

#[tokio::test]
async fn test_remote_never_holds_plaintext() {
    let memory = Arc::new(MemoryRemote::new());
    let remote: Arc<dyn RemoteStore> = memory.clone();
    let local = LocalStore::open_in_memory().expect("open local store");

    let (mut session, _) = Session::login(
        &LoginAction::password("alice", "pw"),
        remote,
        &local,
        &test_config(),
    )
    .await
    .expect("login");

    let passphrase = session.user().passphrase().to_string();
    session.notes_mut().create_note();
    session
        .notes_mut()
        .update_active(
            Document::from_plain_text("Top secret recipe"),
            Some("Top secret recipe".to_string()),
        )
        .expect("active note");
    session.logout(&local).await.expect("logout");

    let dump = memory.dump().expect("dump");
    assert!(!contains_text(&dump, "Top secret"));
    assert!(!contains_text(&dump, &passphrase));
    assert!(contains_text(&dump, "alice:passphrase"));
}

#[tokio::test]
async fn test_transient_write_failures_are_retried() {
    let flaky = Arc::new(FlakyRemote::new(2));
    let remote: Arc<dyn RemoteStore> = flaky.clone();
    let local = LocalStore::open_in_memory().expect("open local store");

    // Registration write fails twice, then succeeds
    let (mut session, _) = Session::login(
        &LoginAction::password("alice", "pw"),
        remote,
        &local,
        &test_config(),
    )
    .await
    .expect("login survives flaky writes");
    assert_eq!(flaky.writes.load(Ordering::SeqCst), 3);

    flaky.failures.store(1, Ordering::SeqCst);
    let id = session.notes_mut().create_note().id;
    session.notes().flush().await;

    assert!(!session.notes().has_unsaved_changes());
    assert_eq!(
        session.notes().save_state(&id),
        Some(notes_core::SaveState::Saved)
    );
}

#[tokio::test]
async fn test_users_do_not_see_each_other() {
    let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemote::new());
    let local = LocalStore::open_in_memory().expect("open local store");
    let config = test_config();

    let (mut alice, _) = Session::login(
        &LoginAction::password("alice", "pw"),
        Arc::clone(&remote),
        &local,
        &config,
    )
    .await
    .expect("alice login");
    alice.notes_mut().create_note();
    alice.logout(&local).await.expect("alice logout");

    // A username that is a prefix of another must not match it
    let (al, report) = Session::login(
        &LoginAction::password("al", "pw"),
        remote,
        &local,
        &config,
    )
    .await
    .expect("al login");
    assert!(report.is_clean());
    assert!(al.notes().is_empty());
}

#[tokio::test]
async fn test_debounced_saves_reach_sqlite_remote() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("remote.db");
    let local = LocalStore::open(&dir.path().join("local.db")).expect("open local store");
    let action = LoginAction::password("alice", "pw");
    let config = test_config();

    {
        let remote: Arc<dyn RemoteStore> =
            Arc::new(SqliteRemote::open(&path).expect("open remote"));
        let (mut session, _) = Session::login(&action, remote, &local, &config)
            .await
            .expect("login");
        session.notes_mut().create_note();
        session
            .notes_mut()
            .update_active(Document::from_plain_text("Persisted"), None)
            .expect("active note");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!session.notes().has_unsaved_changes());
        session.logout(&local).await.expect("logout");
    }

    let remote: Arc<dyn RemoteStore> = Arc::new(SqliteRemote::open(&path).expect("reopen"));
    let (session, _) = Session::login(&action, remote, &local, &config)
        .await
        .expect("login again");
    let notes = session.notes().list();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, DEFAULT_TITLE);
    assert_eq!(notes[0].content.to_plain_text(), "Persisted");
}

/// scrypt log N from the header of a base64 age ciphertext.
fn scrypt_work_factor(ciphertext: &str) -> u8 {
    let raw = STANDARD.decode(ciphertext).expect("base64 ciphertext");
    let header = String::from_utf8_lossy(&raw);
    let stanza = header
        .lines()
        .find(|line| line.starts_with("-> scrypt "))
        .expect("scrypt stanza");
    stanza
        .rsplit(' ')
        .next()
        .and_then(|log_n| log_n.parse().ok())
        .expect("work factor")
}

#[tokio::test]
async fn test_default_config_keeps_note_encryption_cheap() {
    let memory = Arc::new(MemoryRemote::new());
    let remote: Arc<dyn RemoteStore> = memory.clone();
    let user = Arc::new(UserData::new("alice", uuid::Uuid::new_v4().to_string()));
    let config = SyncConfig {
        save_delay_ms: 10,
        ..SyncConfig::default()
    };

    let started = Instant::now();
    let (mut notes, _) = NoteSync::load(Arc::clone(&user), Arc::clone(&remote), &config)
        .await
        .expect("load empty");
    for i in 0..5 {
        notes.create_note();
        notes
            .update_active(Document::from_plain_text(&format!("Note {}", i)), None)
            .expect("active note");
    }
    notes.close().await.expect("close");

    let (reloaded, report) = NoteSync::load(user, remote, &config)
        .await
        .expect("reload");
    assert!(report.is_clean());
    assert_eq!(reloaded.len(), 5);
    // Calibrated scrypt costs about a second per note
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "five notes took {:?}",
        started.elapsed()
    );

    let records = memory
        .read("notes")
        .await
        .expect("read notes")
        .into_value()
        .expect("notes exist");
    for record in records.as_object().expect("record map").values() {
        let ciphertext = record["encryptedNote"].as_str().expect("ciphertext");
        assert_eq!(
            scrypt_work_factor(ciphertext),
            notes_core::config::DEFAULT_NOTE_WORK_FACTOR
        );
    }
}
