//! Durable list persistence for fitcheck.
//!
//! The core only ever needs "read the whole list under a key" and "replace
//! the whole list under a key". [`ListStore`] is that contract; the file
//! backend keeps one JSON document per key under the configured data
//! directory, and the memory backend backs tests and ephemeral sessions.

pub mod backend;
pub mod config;
pub mod error;
pub mod fs;
pub mod memory;

pub use backend::{ListStore, validate_key};
pub use config::StoreConfig;
pub use error::StoreError;
pub use fs::FileListStore;
pub use memory::MemoryListStore;
