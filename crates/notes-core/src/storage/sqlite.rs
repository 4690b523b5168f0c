//! SQLite-backed remote store.
//!
//! Each written path is one row holding a JSON value. No row is ever an
//! ancestor of another row: writing below an existing row rewrites that row,
//! and writing above existing rows replaces them. Subtree reads are assembled
//! client-side from the matching rows.
//!
//! Queries run on tokio's blocking pool, one at a time.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;

use crate::error::{NotesError, Result};
use crate::storage::remote::{RemoteStore, Snapshot};
use crate::storage::tree;

/// Remote store persisted in a SQLite database file.
pub struct SqliteRemote {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRemote").finish_non_exhaustive()
    }
}

impl SqliteRemote {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(Self::sqlite_error)?;
        Self::init(conn)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Self::sqlite_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                path TEXT PRIMARY KEY,
                value_json TEXT NOT NULL
            );
            "#,
        )
        .map_err(Self::sqlite_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn sqlite_error(err: rusqlite::Error) -> NotesError {
        NotesError::Network(format!("SQLite remote error: {}", err))
    }

    /// Run `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| {
                NotesError::Network("SQLite remote connection poisoned".to_string())
            })?;
            op(&mut conn)
        })
        .await?
    }

    fn read_blocking(conn: &Connection, path: &str) -> Result<Snapshot> {
        let segments = tree::segments(path)?;
        let normalized = segments.join("/");

        if let Some((ancestor, value)) = Self::find_ancestor(conn, &segments)? {
            let depth = ancestor.split('/').count();
            return Ok(Snapshot::new(tree::get(&value, &segments[depth..]).cloned()));
        }

        let mut root = Value::Null;
        for (row_path, raw) in Self::subtree_rows(conn, &normalized)? {
            let value = Self::parse_row(&row_path, &raw)?;
            let row_segments = tree::segments(&row_path)?;
            tree::set(&mut root, &row_segments[segments.len()..], value);
        }
        Ok(Snapshot::new(Some(root)))
    }

    fn write_blocking(conn: &mut Connection, path: &str, value: Value) -> Result<()> {
        let segments = Self::require_non_root(path)?;
        let normalized = segments.join("/");
        let tx = conn.transaction().map_err(Self::sqlite_error)?;

        match Self::find_ancestor(&tx, &segments)? {
            Some((ancestor, mut ancestor_value)) => {
                let depth = ancestor.split('/').count();
                tree::set(&mut ancestor_value, &segments[depth..], value);
                Self::upsert(&tx, &ancestor, &ancestor_value)?;
            }
            None => {
                Self::delete_subtree(&tx, &normalized)?;
                if !value.is_null() {
                    Self::upsert(&tx, &normalized, &value)?;
                }
            }
        }

        tx.commit().map_err(Self::sqlite_error)
    }

    fn delete_blocking(conn: &mut Connection, path: &str) -> Result<()> {
        let segments = Self::require_non_root(path)?;
        let normalized = segments.join("/");
        let tx = conn.transaction().map_err(Self::sqlite_error)?;

        match Self::find_ancestor(&tx, &segments)? {
            Some((ancestor, mut ancestor_value)) => {
                let depth = ancestor.split('/').count();
                if tree::remove(&mut ancestor_value, &segments[depth..]) {
                    if tree::is_empty(&ancestor_value) {
                        Self::delete_subtree(&tx, &ancestor)?;
                    } else {
                        Self::upsert(&tx, &ancestor, &ancestor_value)?;
                    }
                }
            }
            None => Self::delete_subtree(&tx, &normalized)?,
        }

        tx.commit().map_err(Self::sqlite_error)
    }

    fn parse_row(path: &str, raw: &str) -> Result<Value> {
        serde_json::from_str(raw).map_err(|e| NotesError::Decode {
            key: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// The stored row that is a strict ancestor of `segments`, if any.
    fn find_ancestor(conn: &Connection, segments: &[&str]) -> Result<Option<(String, Value)>> {
        for depth in 1..segments.len() {
            let candidate = segments[..depth].join("/");
            let raw: Option<String> = conn
                .query_row(
                    "SELECT value_json FROM records WHERE path = ?1",
                    params![candidate],
                    |row| row.get(0),
                )
                .optional()
                .map_err(Self::sqlite_error)?;
            if let Some(raw) = raw {
                let value = Self::parse_row(&candidate, &raw)?;
                return Ok(Some((candidate, value)));
            }
        }
        Ok(None)
    }

    /// Rows at `path` or below it.
    fn subtree_rows(conn: &Connection, path: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = if path.is_empty() {
            conn.prepare("SELECT path, value_json FROM records ORDER BY path")
        } else {
            conn.prepare(
                "SELECT path, value_json FROM records
                 WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'
                 ORDER BY path",
            )
        }
        .map_err(Self::sqlite_error)?;

        let mapper = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, String)> {
            Ok((row.get(0)?, row.get(1)?))
        };
        let rows = if path.is_empty() {
            stmt.query_map([], mapper)
        } else {
            stmt.query_map(params![path], mapper)
        }
        .map_err(Self::sqlite_error)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Self::sqlite_error)
    }

    fn delete_subtree(tx: &Transaction<'_>, path: &str) -> Result<()> {
        tx.execute(
            "DELETE FROM records
             WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
            params![path],
        )
        .map_err(Self::sqlite_error)?;
        Ok(())
    }

    fn upsert(tx: &Transaction<'_>, path: &str, value: &Value) -> Result<()> {
        tx.execute(
            "INSERT INTO records (path, value_json) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET value_json = excluded.value_json",
            params![path, value.to_string()],
        )
        .map_err(Self::sqlite_error)?;
        Ok(())
    }

    fn require_non_root<'a>(path: &'a str) -> Result<Vec<&'a str>> {
        let segments = tree::segments(path)?;
        if segments.is_empty() {
            return Err(NotesError::InvalidInput(
                "Cannot replace the root of the remote store".to_string(),
            ));
        }
        Ok(segments)
    }
}

#[async_trait]
impl RemoteStore for SqliteRemote {
    async fn read(&self, path: &str) -> Result<Snapshot> {
        let path = path.to_string();
        self.with_conn(move |conn| Self::read_blocking(conn, &path)).await
    }

    async fn write(&self, path: &str, value: Value) -> Result<()> {
        let path = path.to_string();
        self.with_conn(move |conn| Self::write_blocking(conn, &path, value)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = path.to_string();
        self.with_conn(move |conn| Self::delete_blocking(conn, &path)).await
    }
}
