//! Saved outfits: durable, most-recent-first snapshots of a session.
//!
//! The whole list is stored as one JSON array under [`SAVED_OUTFITS_KEY`]
//! and rewritten on every mutation. Entries are value copies of the
//! history at save time and are never mutated after creation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fitcheck_store::{ListStore, StoreError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::history::{LayerSnapshot, OutfitHistory, SnapshotError};
use crate::model::ImageRef;
use crate::pose::POSE_COUNT;

/// List key the saved outfits are persisted under.
pub const SAVED_OUTFITS_KEY: &str = "saved-outfits";

/// An immutable snapshot of a session's layers and pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedOutfit {
    pub id: String,
    /// The image that was on screen when the outfit was saved.
    pub preview_url: ImageRef,
    /// Every layer at save time, retained tail included.
    pub layers: Vec<LayerSnapshot>,
    pub pose_index: usize,
    #[serde(rename = "activeLayerIndex")]
    pub layer_index: usize,
    /// Absent in lists written before timestamps were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SavedOutfit {
    /// Capture a new saved outfit with a fresh id and the current time.
    pub fn new(
        preview_url: ImageRef,
        layers: Vec<LayerSnapshot>,
        pose_index: usize,
        layer_index: usize,
    ) -> Self {
        Self {
            id: format!("saved-{}", Uuid::new_v4().simple()),
            preview_url,
            layers,
            pose_index,
            layer_index,
            created_at: Some(Utc::now()),
        }
    }

    /// Check that this outfit can be loaded into a session.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.to_history().map(|_| ())
    }

    /// Rebuild a live history from the saved layers. The result shares no
    /// layer or cache instance with `self`.
    pub fn to_history(&self) -> Result<OutfitHistory, SnapshotError> {
        if self.pose_index >= POSE_COUNT {
            return Err(SnapshotError::PoseOutOfRange(self.pose_index));
        }
        OutfitHistory::restore(&self.layers, self.layer_index)
    }

    /// Garments in the layers that were visible at save time.
    pub fn garment_names(&self) -> Vec<&str> {
        self.layers
            .iter()
            .take(self.layer_index + 1)
            .filter_map(|layer| layer.garment.as_ref().map(|g| g.name.as_str()))
            .collect()
    }
}

/// The saved-outfit list, mirrored in memory and persisted through a
/// [`ListStore`].
pub struct SavedOutfitStore {
    backend: Arc<dyn ListStore>,
    key: String,
    outfits: Vec<SavedOutfit>,
}

impl std::fmt::Debug for SavedOutfitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SavedOutfitStore")
            .field("backend", &self.backend.name())
            .field("key", &self.key)
            .field("outfits", &self.outfits.len())
            .finish()
    }
}

impl SavedOutfitStore {
    /// Open the saved list under [`SAVED_OUTFITS_KEY`].
    pub async fn open(backend: Arc<dyn ListStore>) -> Self {
        Self::open_with_key(backend, SAVED_OUTFITS_KEY).await
    }

    /// Open the saved list under `key`.
    ///
    /// Never fails: unreadable or corrupt data opens as an empty list, and
    /// individual entries that do not decode or validate are skipped.
    pub async fn open_with_key(backend: Arc<dyn ListStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let outfits = match backend.read_list(&key).await {
            Ok(Some(contents)) => decode_list(&key, &contents),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, backend = %backend.name(), error = %e, "saved outfits unreadable, starting empty");
                Vec::new()
            }
        };
        debug!(key = %key, count = outfits.len(), "saved outfits opened");
        Self {
            backend,
            key,
            outfits,
        }
    }

    /// All saved outfits, most recent first.
    pub fn list(&self) -> &[SavedOutfit] {
        &self.outfits
    }

    pub fn get(&self, id: &str) -> Option<&SavedOutfit> {
        self.outfits.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.outfits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outfits.is_empty()
    }

    /// Put `outfit` at the front of the list and persist the whole list.
    ///
    /// The in-memory list keeps the outfit even if persisting fails.
    pub async fn prepend(&mut self, outfit: SavedOutfit) -> Result<(), StoreError> {
        info!(id = %outfit.id, layers = outfit.layers.len(), "outfit saved");
        self.outfits.insert(0, outfit);
        self.persist().await
    }

    /// Remove the outfit with `id`. Returns `Ok(false)` without touching the
    /// durable copy when no such outfit exists.
    pub async fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.outfits.len();
        self.outfits.retain(|o| o.id != id);
        if self.outfits.len() == before {
            return Ok(false);
        }
        info!(id = %id, "saved outfit deleted");
        self.persist().await?;
        Ok(true)
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let contents = serde_json::to_string(&self.outfits)?;
        self.backend.write_list(&self.key, &contents).await
    }
}

fn decode_list(key: &str, contents: &str) -> Vec<SavedOutfit> {
    let entries = match serde_json::from_str::<serde_json::Value>(contents) {
        Ok(serde_json::Value::Array(entries)) => entries,
        Ok(_) => {
            warn!(key = %key, "saved outfits document is not a list, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(key = %key, error = %e, "saved outfits corrupt, starting empty");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let outfit = match serde_json::from_value::<SavedOutfit>(entry) {
                Ok(outfit) => outfit,
                Err(e) => {
                    warn!(key = %key, position, error = %e, "skipping undecodable saved outfit");
                    return None;
                }
            };
            match outfit.validate() {
                Ok(()) => Some(outfit),
                Err(e) => {
                    warn!(key = %key, id = %outfit.id, error = %e, "skipping invalid saved outfit");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Garment;
    use crate::pose::POSE_INSTRUCTIONS;
    use fitcheck_store::MemoryListStore;

    fn sample_layers() -> Vec<LayerSnapshot> {
        let mut history = OutfitHistory::start(ImageRef::new("model"));
        history.branch(
            0,
            crate::history::OutfitLayer::with_garment(
                Garment::new("tee", "White Tee", "https://img/tee.png"),
                POSE_INSTRUCTIONS[0],
                ImageRef::new("tee-front"),
            ),
        );
        history.snapshot_layers()
    }

    fn sample() -> SavedOutfit {
        SavedOutfit::new(ImageRef::new("tee-front"), sample_layers(), 0, 1)
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(sample().id, sample().id);
    }

    #[test]
    fn json_uses_wire_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();
        for key in ["id", "previewUrl", "layers", "poseIndex", "activeLayerIndex", "createdAt"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn validate_rejects_bad_pointers() {
        let mut outfit = sample();
        outfit.pose_index = POSE_COUNT;
        assert_eq!(
            outfit.validate().unwrap_err(),
            SnapshotError::PoseOutOfRange(POSE_COUNT)
        );

        let mut outfit = sample();
        outfit.layer_index = 5;
        assert!(matches!(
            outfit.validate().unwrap_err(),
            SnapshotError::LayerOutOfRange { index: 5, len: 2 }
        ));
    }

    #[test]
    fn garment_names_follow_visible_layers() {
        let mut outfit = sample();
        assert_eq!(outfit.garment_names(), vec!["White Tee"]);
        outfit.layer_index = 0;
        assert!(outfit.garment_names().is_empty());
    }

    #[tokio::test]
    async fn prepend_is_most_recent_first() {
        let backend = Arc::new(MemoryListStore::new());
        let mut store = SavedOutfitStore::open(backend.clone()).await;

        let first = sample();
        let second = sample();
        store.prepend(first.clone()).await.unwrap();
        store.prepend(second.clone()).await.unwrap();

        assert_eq!(store.list()[0].id, second.id);
        assert_eq!(store.list()[1].id, first.id);
        assert_eq!(backend.write_count(), 2);

        let reopened = SavedOutfitStore::open(backend).await;
        assert_eq!(reopened.list(), store.list());
    }

    #[tokio::test]
    async fn delete_unknown_id_does_not_write() {
        let backend = Arc::new(MemoryListStore::new());
        let mut store = SavedOutfitStore::open(backend.clone()).await;
        store.prepend(sample()).await.unwrap();

        assert!(!store.delete("saved-missing").await.unwrap());
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn delete_rewrites_list() {
        let backend = Arc::new(MemoryListStore::new());
        let mut store = SavedOutfitStore::open(backend.clone()).await;
        let outfit = sample();
        store.prepend(outfit.clone()).await.unwrap();

        assert!(store.delete(&outfit.id).await.unwrap());

        assert!(store.is_empty());
        assert_eq!(backend.get(SAVED_OUTFITS_KEY).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn corrupt_document_opens_empty() {
        for contents in ["{not json", r#"{"id":"x"}"#, "42"] {
            let backend = Arc::new(MemoryListStore::with_list(SAVED_OUTFITS_KEY, contents));
            let store = SavedOutfitStore::open(backend).await;
            assert!(store.is_empty(), "contents {contents:?}");
        }
    }

    #[tokio::test]
    async fn bad_entries_are_skipped() {
        let good = sample();
        let mut invalid = sample();
        invalid.layers.clear();
        let contents = serde_json::to_string(&serde_json::json!([
            good,
            { "id": "half-written" },
            invalid,
        ]))
        .unwrap();
        let backend = Arc::new(MemoryListStore::with_list(SAVED_OUTFITS_KEY, contents));

        let store = SavedOutfitStore::open(backend).await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].id, good.id);
    }

    #[tokio::test]
    async fn entries_without_timestamp_still_load() {
        let mut outfit = sample();
        outfit.created_at = None;
        let contents = serde_json::to_string(&vec![outfit.clone()]).unwrap();
        assert!(!contents.contains("createdAt"));
        let backend = Arc::new(MemoryListStore::with_list(SAVED_OUTFITS_KEY, contents));

        let store = SavedOutfitStore::open(backend).await;

        assert_eq!(store.get(&outfit.id), Some(&outfit));
    }
}
