//! Storage abstraction for Notes.
//!
//! Two tiers:
//! - **Local**: a small JSON key-value store for session indicators
//! - **Remote**: a path-addressed JSON tree holding credential and note
//!   ciphertext, behind the async `RemoteStore` trait
//!
//! ## Security
//!
//! Nothing written to the remote tier is plaintext: credential records hold
//! the passphrase encrypted under the login password, note records hold notes
//! encrypted under the passphrase.

pub mod keys;
pub mod local;
pub mod memory;
pub mod remote;
pub mod sqlite;
pub mod tree;

// Re-export public types
pub use keys::{CredentialRecord, NoteKey, NoteRecord};
pub use local::LocalStore;
pub use memory::MemoryRemote;
pub use remote::{RemoteStore, Snapshot};
pub use sqlite::SqliteRemote;
