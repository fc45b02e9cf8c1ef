//! The `ListStore` trait -- the persistence interface for whole-list blobs.
//!
//! Every mutation of a persisted list rewrites the entire serialized
//! document, so the trait has no append or patch operations. Contents are
//! opaque strings; callers own the encoding.

use async_trait::async_trait;

use crate::error::StoreError;

/// Durable key-value persistence for serialized lists.
///
/// # Object Safety
///
/// The trait is object-safe so stores can be shared as
/// `Arc<dyn ListStore>` between the session and the CLI.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Short backend name for logs (e.g. "file", "memory").
    fn name(&self) -> &str;

    /// Read the serialized list stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing has been written under the key yet.
    async fn read_list(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the serialized list stored under `key`.
    async fn write_list(&self, key: &str, contents: &str) -> Result<(), StoreError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ListStore) {}
};

/// Check that `key` is usable as a list key on every backend.
///
/// Keys double as file stems for the file backend, so they are restricted
/// to `[a-z0-9_-]` and must be non-empty.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_keys() {
        assert!(validate_key("saved-outfits").is_ok());
        assert!(validate_key("v2_lists").is_ok());
    }

    #[test]
    fn rejects_path_like_keys() {
        for key in ["", "../etc", "Saved", "a/b", "with space", "x.json"] {
            let err = validate_key(key).unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "key {key:?}");
        }
    }
}
