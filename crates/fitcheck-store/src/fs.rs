//! File-backed list store.
//!
//! Each key maps to `<root>/<key>.json`. Writes go to a sibling temp file
//! first and are renamed into place, so a crash mid-write leaves the
//! previous document intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::backend::{ListStore, validate_key};
use crate::config::list_path_in;
use crate::error::StoreError;

/// A [`ListStore`] keeping one JSON document per key in a directory.
#[derive(Debug, Clone)]
pub struct FileListStore {
    root: PathBuf,
}

impl FileListStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Return the directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ListStore for FileListStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn read_list(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        let path = list_path_in(&self.root, key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read { path, source: e }),
        }
    }

    async fn write_list(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::Write {
                path: self.root.clone(),
                source: e,
            })?;

        let path = list_path_in(&self.root, key);
        let tmp = self.root.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| StoreError::Write {
                path: tmp.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Write {
                path: path.clone(),
                source: e,
            })?;

        debug!(path = %path.display(), bytes = contents.len(), "list written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileListStore::new(tmp.path());
        assert!(store.read_list("saved-outfits").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_creates_root_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("nested").join("data");
        let store = FileListStore::new(&root);

        store.write_list("saved-outfits", "[]").await.unwrap();

        assert!(root.join("saved-outfits.json").exists());
        assert!(!root.join(".saved-outfits.json.tmp").exists());
    }

    #[tokio::test]
    async fn invalid_key_is_rejected_before_touching_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FileListStore::new(tmp.path().join("never"));

        let err = store.write_list("../escape", "[]").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
        assert!(!tmp.path().join("never").exists());
    }
}
