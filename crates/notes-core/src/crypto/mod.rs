//! Cryptographic operations for Notes.
//!
//! - **Age**: passphrase (scrypt) encryption, authenticated
//! - Random per-user passphrases generated from v4 UUIDs
//!
//! ## Threat Model
//!
//! We defend against:
//! - A remote store operator reading notes or passphrases
//! - Wrong passwords silently producing a wrong session passphrase
//!
//! We do NOT defend against:
//! - Compromised client / keylogger
//! - Concurrent writers overwriting each other's notes

pub mod cipher;
pub mod passphrase;

pub use cipher::Cipher;
pub use passphrase::{generate_passphrase, validate_password};
