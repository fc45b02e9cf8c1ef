use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::model::{Garment, ImageRef};
use crate::pose::PoseCache;

/// One outfit state: the garment added at this step plus every pose
/// rendered for it so far.
///
/// The garment is fixed at construction. The pose cache only ever grows,
/// and it is shared: a layer lives behind an `Arc` in the history, so a
/// pose generated once is visible from every path that reaches the layer.
#[derive(Debug)]
pub struct OutfitLayer {
    /// `None` marks the base model layer (index 0 only).
    garment: Option<Garment>,
    poses: RwLock<PoseCache>,
}

/// Plain-data copy of a layer, used by saved outfits and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSnapshot {
    pub garment: Option<Garment>,
    pub pose_images: PoseCache,
}

impl OutfitLayer {
    /// The base model layer, holding the finalized model image.
    pub fn base(pose: impl Into<String>, image: ImageRef) -> Self {
        Self {
            garment: None,
            poses: RwLock::new(PoseCache::with_entry(pose, image)),
        }
    }

    /// A layer produced by applying `garment`, rendered in `pose`.
    pub fn with_garment(garment: Garment, pose: impl Into<String>, image: ImageRef) -> Self {
        Self {
            garment: Some(garment),
            poses: RwLock::new(PoseCache::with_entry(pose, image)),
        }
    }

    /// Rebuild a live layer from a snapshot. Returns `None` when the
    /// snapshot's cache is empty.
    pub fn from_snapshot(snapshot: LayerSnapshot) -> Option<Self> {
        if snapshot.pose_images.is_empty() {
            return None;
        }
        Some(Self {
            garment: snapshot.garment,
            poses: RwLock::new(snapshot.pose_images),
        })
    }

    pub fn garment(&self) -> Option<&Garment> {
        self.garment.as_ref()
    }

    pub fn garment_id(&self) -> Option<&str> {
        self.garment.as_ref().map(|g| g.id.as_str())
    }

    pub fn is_base(&self) -> bool {
        self.garment.is_none()
    }

    pub fn pose_image(&self, pose: &str) -> Option<ImageRef> {
        self.read().get(pose).cloned()
    }

    pub fn has_pose(&self, pose: &str) -> bool {
        self.read().contains(pose)
    }

    /// Earliest cached image, the reference for new pose renders.
    pub fn first_image(&self) -> Option<ImageRef> {
        self.read().first().map(|(_, image)| image.clone())
    }

    /// Image to show for `pose`: the cached render if present, otherwise the
    /// earliest cached image of this layer.
    pub fn display_image(&self, pose: &str) -> Option<ImageRef> {
        let cache = self.read();
        cache
            .get(pose)
            .or_else(|| cache.first().map(|(_, image)| image))
            .cloned()
    }

    /// Cached pose keys in insertion order.
    pub fn cached_poses(&self) -> Vec<String> {
        self.read().poses().map(str::to_string).collect()
    }

    pub fn pose_count(&self) -> usize {
        self.read().len()
    }

    /// Add a rendered pose to this layer's cache.
    pub fn insert_pose(&self, pose: impl Into<String>, image: ImageRef) {
        self.poses
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(pose, image);
    }

    /// Deep copy: new cache instance, shared image references.
    pub fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            garment: self.garment.clone(),
            pose_images: self.read().clone(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, PoseCache> {
        self.poses.read().unwrap_or_else(|e| e.into_inner())
    }
}
