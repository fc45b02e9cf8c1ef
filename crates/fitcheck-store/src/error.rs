use std::path::PathBuf;

/// Errors from the list persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to encode list: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid list key {0:?} (expected lowercase letters, digits, '-' or '_')")]
    InvalidKey(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
