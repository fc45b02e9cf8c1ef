//! In-memory list store for tests and throwaway sessions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::backend::{ListStore, validate_key};
use crate::error::StoreError;

/// A [`ListStore`] that keeps every list in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryListStore {
    lists: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryListStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `contents` under `key`.
    ///
    /// Seeding bypasses key validation and the write counter so tests can
    /// plant arbitrary (including corrupt) documents.
    pub fn with_list(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let store = Self::default();
        store
            .lists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into(), contents.into());
        store
    }

    /// Current raw contents under `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Number of successful `write_list` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListStore for MemoryListStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn read_list(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.get(key))
    }

    async fn write_list(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.lists
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
