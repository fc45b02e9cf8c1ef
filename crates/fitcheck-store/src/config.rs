use std::env;
use std::path::{Path, PathBuf};

use crate::fs::FileListStore;

/// Storage configuration.
///
/// Reads from the `FITCHECK_DATA_DIR` environment variable, falling back to
/// the XDG data directory (`$XDG_DATA_HOME/fitcheck` or
/// `~/.local/share/fitcheck`) when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one JSON document per list key.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Environment variable that overrides the data directory.
    pub const DATA_DIR_ENV: &str = "FITCHECK_DATA_DIR";

    /// Build a config from the environment.
    ///
    /// Priority: `FITCHECK_DATA_DIR` env var, then [`Self::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var(Self::DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_data_dir());
        Self { data_dir }
    }

    /// Build a config from an explicit directory (useful for tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The XDG data directory for fitcheck.
    ///
    /// Uses `$XDG_DATA_HOME/fitcheck` when set, otherwise
    /// `~/.local/share/fitcheck` on every platform.
    pub fn default_data_dir() -> PathBuf {
        if let Ok(xdg) = env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("fitcheck");
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("share")
            .join("fitcheck")
    }

    /// Path of the document backing `key`.
    pub fn list_path(&self, key: &str) -> PathBuf {
        list_path_in(&self.data_dir, key)
    }

    /// Open a file-backed store rooted at the configured directory.
    pub fn open_file_store(&self) -> FileListStore {
        FileListStore::new(&self.data_dir)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

pub(crate) fn list_path_in(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_new() {
        let cfg = StoreConfig::new("/tmp/fitcheck-data");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/fitcheck-data"));
    }

    #[test]
    fn list_path_uses_json_extension() {
        let cfg = StoreConfig::new("/data");
        assert_eq!(
            cfg.list_path("saved-outfits"),
            PathBuf::from("/data/saved-outfits.json")
        );
    }

    #[test]
    fn default_dir_ends_with_crate_name() {
        let dir = StoreConfig::default_data_dir();
        assert!(dir.ends_with("fitcheck"), "unexpected dir: {}", dir.display());
    }
}
