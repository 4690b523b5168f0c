//! # Notes Core
//!
//! Core library for Notes - end-to-end encrypted notes synchronized with a
//! remote key-value store.
//!
//! This crate provides the credential protocol, note model, and
//! synchronization layer independent of any front end.
//!
//! ## Architecture
//!
//! - **crypto**: passphrase-based cipher and random passphrase generation
//! - **storage**: local key-value store and remote store adapters
//! - **credentials**: login password -> per-user passphrase derivation
//! - **note** / **editor**: note model and the editor adapter contract
//! - **debounce** / **retry**: scheduling primitives used by sync
//! - **sync**: in-memory note cache with debounced encrypted write-through
//! - **session**: login/logout glue over all of the above
//!
//! ## Security Model
//!
//! - Each user owns a random passphrase; only its ciphertext under the login
//!   password is stored remotely
//! - Notes are stored remotely only as ciphertext under that passphrase
//! - Plaintext lives in memory for the duration of a session

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod logging;
pub mod note;
pub mod retry;
pub mod session;
pub mod storage;
pub mod sync;

pub use config::SyncConfig;
pub use credentials::{CredentialService, FederatedIdentity, LoginAction, UserData};
pub use editor::{Editor, EditorUpdate, TextEditor};
pub use error::{NotesError, Result};
pub use note::{Document, Note, DEFAULT_TITLE};
pub use session::Session;
pub use storage::{LocalStore, MemoryRemote, RemoteStore, SqliteRemote};
pub use sync::{FailureKind, LoadReport, NoteSync, PendingDelete, RecordFailure, SaveState};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
