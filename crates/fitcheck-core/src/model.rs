use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Image references
// ---------------------------------------------------------------------------

/// An opaque reference to an image (URL or data URL).
///
/// The core never inspects image contents; references are compared by value
/// and shared freely between layers and saved snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ImageRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Garments
// ---------------------------------------------------------------------------

/// A wearable item. Identity is `id`; the core references garments but
/// never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Garment {
    /// Stable unique identifier.
    pub id: String,
    /// Display name (e.g. "Denim Jacket").
    pub name: String,
    /// Source image of the garment itself.
    pub url: ImageRef,
}

impl Garment {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<ImageRef>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}
