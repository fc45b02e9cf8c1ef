//! Outfit history: an index-addressed arena of layers with one cursor.
//!
//! ```text
//! index:    0        1        2        3
//! layers: [base] -> [G1] -> [G2] -> [G3]
//!                            ^ current
//!                                    \__ retained tail (redo by reuse)
//! ```
//!
//! Everything up to and including the cursor is the visible outfit.
//! Layers past the cursor are kept only so that re-applying the same next
//! garment can advance the cursor instead of generating again. Applying a
//! different garment truncates the tail and appends.

mod layer;

use std::sync::Arc;

use thiserror::Error;

pub use layer::{LayerSnapshot, OutfitLayer};

use crate::model::ImageRef;
use crate::pose;

/// Reasons a snapshot cannot be turned back into a live history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot has no layers")]
    Empty,

    #[error("layer 0 must be the base model layer")]
    MissingBase,

    #[error("layer {0} has no garment but is not the base layer")]
    MisplacedBase(usize),

    #[error("layer {0} has no cached poses")]
    EmptyPoseCache(usize),

    #[error("layer index {index} is out of range for {len} layers")]
    LayerOutOfRange { index: usize, len: usize },

    #[error("pose index {0} is out of range")]
    PoseOutOfRange(usize),
}

/// The live layer sequence of a session plus its layer cursor.
#[derive(Debug, Default)]
pub struct OutfitHistory {
    layers: Vec<Arc<OutfitLayer>>,
    current: usize,
}

impl OutfitHistory {
    /// An empty history (no model image finalized yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding only the base layer, rendered in the first pose.
    pub fn start(model_image: ImageRef) -> Self {
        Self {
            layers: vec![Arc::new(OutfitLayer::base(
                pose::POSE_INSTRUCTIONS[0],
                model_image,
            ))],
            current: 0,
        }
    }

    /// Rebuild a history from snapshots, validating the layer invariants.
    ///
    /// Every layer is a fresh instance; nothing is shared with `snapshots`.
    pub fn restore(snapshots: &[LayerSnapshot], current: usize) -> Result<Self, SnapshotError> {
        if snapshots.is_empty() {
            return Err(SnapshotError::Empty);
        }
        if current >= snapshots.len() {
            return Err(SnapshotError::LayerOutOfRange {
                index: current,
                len: snapshots.len(),
            });
        }

        let mut layers = Vec::with_capacity(snapshots.len());
        for (i, snapshot) in snapshots.iter().enumerate() {
            match (i, snapshot.garment.is_some()) {
                (0, true) => return Err(SnapshotError::MissingBase),
                (i, false) if i > 0 => return Err(SnapshotError::MisplacedBase(i)),
                _ => {}
            }
            let layer = OutfitLayer::from_snapshot(snapshot.clone())
                .ok_or(SnapshotError::EmptyPoseCache(i))?;
            layers.push(Arc::new(layer));
        }

        Ok(Self { layers, current })
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total layers, including any retained tail.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn layer(&self, index: usize) -> Option<&Arc<OutfitLayer>> {
        self.layers.get(index)
    }

    pub fn current_layer(&self) -> Option<&Arc<OutfitLayer>> {
        self.layers.get(self.current)
    }

    /// The layer right after the cursor, if one is retained.
    pub fn next_layer(&self) -> Option<&Arc<OutfitLayer>> {
        self.layers.get(self.current + 1)
    }

    /// Layers `[0..=current]`: the outfit as currently displayed.
    pub fn visible_layers(&self) -> &[Arc<OutfitLayer>] {
        if self.layers.is_empty() {
            return &[];
        }
        &self.layers[..=self.current]
    }

    /// Advance the cursor onto the retained next layer if it was made from
    /// `garment_id`. Returns `true` when the cursor moved.
    pub fn try_reuse(&mut self, garment_id: &str) -> bool {
        let reusable = self
            .next_layer()
            .is_some_and(|next| next.garment_id() == Some(garment_id));
        if reusable {
            self.current += 1;
        }
        reusable
    }

    /// Drop every layer after `base_index`, append `layer`, and move the
    /// cursor onto it. Returns the new cursor.
    ///
    /// `base_index` is the cursor captured when the generation call was
    /// issued, so an undo in the meantime cannot shift where the branch lands.
    pub fn branch(&mut self, base_index: usize, layer: OutfitLayer) -> usize {
        let keep = (base_index + 1).min(self.layers.len());
        self.layers.truncate(keep);
        self.layers.push(Arc::new(layer));
        self.current = self.layers.len() - 1;
        self.current
    }

    /// Move the cursor back one layer, keeping the layer in the tail.
    /// Returns `false` at the base layer.
    pub fn step_back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Deep copy of every layer, retained tail included.
    pub fn snapshot_layers(&self) -> Vec<LayerSnapshot> {
        self.layers.iter().map(|layer| layer.snapshot()).collect()
    }

    /// Garment ids of the visible layers, base layer excluded.
    pub fn active_garment_ids(&self) -> Vec<String> {
        self.visible_layers()
            .iter()
            .filter_map(|layer| layer.garment_id().map(str::to_string))
            .collect()
    }
}
