//! Application-level utilities for the Notes CLI.
//!
//! This module provides:
//! - Path resolution for config and data files
//! - Session opening with password handling

mod context;
mod resolver;

// Re-export public API
pub use context::AppContext;
