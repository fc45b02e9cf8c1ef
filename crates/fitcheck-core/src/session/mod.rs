//! Session controller: the single entry point for every user action.
//!
//! The controller owns the live [`OutfitHistory`], the two pointers, the
//! wardrobe and the error surface, and it is the only caller of the
//! [`ImageGenerator`]. State lives behind a plain mutex that is never held
//! across an `.await`; the generation call happens with the lock released
//! and its result is committed afterwards.
//!
//! Commits are guarded in two ways:
//!
//! - a garment result branches from the layer index captured when the call
//!   was issued, and a pose result is written into the layer captured at
//!   that time, so pointer moves during the call cannot redirect them;
//! - `start`, `start_over` and `load_outfit` advance the session epoch, and
//!   a result from an older epoch is discarded.

mod gate;

use std::sync::{Arc, Mutex, MutexGuard};

use fitcheck_store::ListStore;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use gate::{GenerationPermit, LoadingGate};

use crate::error::SessionError;
use crate::generator::ImageGenerator;
use crate::history::{OutfitHistory, OutfitLayer};
use crate::model::{Garment, ImageRef};
use crate::pose::{POSE_COUNT, POSE_INSTRUCTIONS};
use crate::saved::{SavedOutfit, SavedOutfitStore};
use crate::wardrobe::WardrobeSet;

/// Why a request was ignored without doing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another generation call is in flight.
    Busy,
    /// No model image has been started.
    NoModel,
    /// Only the base layer exists.
    NothingToSave,
    /// The current layer has no cached image to vary.
    NoReference,
}

/// Result of [`SessionController::apply_garment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The retained next layer matched; the pointer advanced without a call.
    Reused { layer_index: usize },
    /// A new layer was generated and appended.
    Generated { layer_index: usize },
    Skipped(SkipReason),
    /// The session was restarted or reloaded while the call was in flight.
    Discarded,
}

/// Result of [`SessionController::select_pose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseOutcome {
    /// The requested pose was already selected.
    Unchanged,
    CacheHit { pose_index: usize },
    Generated { pose_index: usize },
    Skipped(SkipReason),
    Discarded,
}

/// Result of [`SessionController::save_outfit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { id: String },
    Skipped(SkipReason),
}

/// Read-only projection of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub display_image: Option<ImageRef>,
    pub layer_index: usize,
    pub pose_index: usize,
    pub pose_instruction: &'static str,
    pub history_len: usize,
    pub active_garment_ids: Vec<String>,
    pub available_poses: Vec<String>,
    pub is_loading: bool,
    pub loading_message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    history: OutfitHistory,
    pose_index: usize,
    wardrobe: WardrobeSet,
    error: Option<String>,
    epoch: u64,
}

impl SessionState {
    fn pose_instruction(&self) -> &'static str {
        POSE_INSTRUCTIONS[self.pose_index]
    }

    fn display_image(&self) -> Option<ImageRef> {
        self.history
            .current_layer()
            .and_then(|layer| layer.display_image(self.pose_instruction()))
    }

    fn reset_to(&mut self, history: OutfitHistory, pose_index: usize) {
        self.history = history;
        self.pose_index = pose_index;
        self.error = None;
        self.epoch += 1;
    }
}

/// Orchestrates one try-on session against an [`ImageGenerator`].
pub struct SessionController {
    generator: Arc<dyn ImageGenerator>,
    state: Mutex<SessionState>,
    gate: LoadingGate,
    saved: tokio::sync::Mutex<SavedOutfitStore>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("generator", &self.generator.name())
            .field("state", &*self.lock_state())
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Build a controller with the default wardrobe, opening the saved list
    /// from `backend`.
    pub async fn new(generator: Arc<dyn ImageGenerator>, backend: Arc<dyn ListStore>) -> Self {
        let saved = SavedOutfitStore::open(backend).await;
        Self::with_parts(generator, WardrobeSet::with_defaults(), saved)
    }

    pub fn with_parts(
        generator: Arc<dyn ImageGenerator>,
        wardrobe: WardrobeSet,
        saved: SavedOutfitStore,
    ) -> Self {
        Self {
            generator,
            state: Mutex::new(SessionState {
                history: OutfitHistory::new(),
                pose_index: 0,
                wardrobe,
                error: None,
                epoch: 0,
            }),
            gate: LoadingGate::new(),
            saved: tokio::sync::Mutex::new(saved),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Begin a session on a finalized model image: a single base layer,
    /// both pointers at zero.
    pub fn start(&self, model_image: ImageRef) {
        info!(model = %model_image, "session started");
        self.lock_state()
            .reset_to(OutfitHistory::start(model_image), 0);
    }

    /// Discard the session and restore the default wardrobe. Saved outfits
    /// are kept.
    pub fn start_over(&self) {
        let mut state = self.lock_state();
        state.reset_to(OutfitHistory::new(), 0);
        state.wardrobe.reset();
        info!("session reset");
    }

    // -----------------------------------------------------------------------
    // Garments
    // -----------------------------------------------------------------------

    /// Apply `garment` on top of the current layer.
    ///
    /// Reuses the retained next layer when it was made from the same
    /// garment; otherwise issues one generation call and branches from the
    /// current layer. On failure nothing is committed and the friendly
    /// message is stored in the error surface.
    pub async fn apply_garment(&self, garment: Garment) -> Result<ApplyOutcome, SessionError> {
        let Some(permit) = self.gate.try_acquire() else {
            debug!(garment = %garment.id, "apply rejected: generation in flight");
            return Ok(ApplyOutcome::Skipped(SkipReason::Busy));
        };

        let (base_image, base_index, instruction, epoch) = {
            let mut state = self.lock_state();
            let Some(display) = state.display_image() else {
                return Ok(ApplyOutcome::Skipped(SkipReason::NoModel));
            };
            if state.history.try_reuse(&garment.id) {
                state.pose_index = 0;
                let layer_index = state.history.current_index();
                info!(garment = %garment.id, layer = layer_index, "layer reused");
                return Ok(ApplyOutcome::Reused { layer_index });
            }
            state.error = None;
            (
                display,
                state.history.current_index(),
                state.pose_instruction(),
                state.epoch,
            )
        };

        permit.set_message(format!("Adding {}...", garment.name));
        let result = self.generator.apply_garment(&base_image, &garment).await;

        let mut state = self.lock_state();
        if state.epoch != epoch {
            info!(garment = %garment.id, "garment result discarded: session changed");
            return Ok(ApplyOutcome::Discarded);
        }
        match result {
            Ok(image) => {
                let layer = OutfitLayer::with_garment(garment.clone(), instruction, image);
                let layer_index = state.history.branch(base_index, layer);
                state.pose_index = 0;
                state.wardrobe.add(garment.clone());
                info!(garment = %garment.id, layer = layer_index, "garment applied");
                Ok(ApplyOutcome::Generated { layer_index })
            }
            Err(source) => {
                let err = SessionError::garment(source);
                warn!(garment = %garment.id, error = %err, "garment application failed");
                state.error = Some(err.friendly_message());
                Err(err)
            }
        }
    }

    /// Step back one layer. The layer stays in the retained tail so that
    /// re-applying the same garment reuses it. Returns `false` at the base.
    pub fn remove_last_garment(&self) -> bool {
        let mut state = self.lock_state();
        if !state.history.step_back() {
            return false;
        }
        state.pose_index = 0;
        debug!(layer = state.history.current_index(), "stepped back");
        true
    }

    // -----------------------------------------------------------------------
    // Poses
    // -----------------------------------------------------------------------

    /// Switch the current layer to the pose at `index`.
    ///
    /// A cached pose moves the pointer immediately. A missing pose moves
    /// the pointer optimistically, asks the generator to vary the layer's
    /// earliest cached image, and rolls the pointer back if that fails.
    pub async fn select_pose(&self, index: usize) -> Result<PoseOutcome, SessionError> {
        if index >= POSE_COUNT {
            return Err(SessionError::PoseOutOfRange {
                index,
                count: POSE_COUNT,
            });
        }
        let Some(permit) = self.gate.try_acquire() else {
            debug!(pose = index, "pose change rejected: generation in flight");
            return Ok(PoseOutcome::Skipped(SkipReason::Busy));
        };

        let instruction = POSE_INSTRUCTIONS[index];
        let (layer, reference, previous, epoch) = {
            let mut state = self.lock_state();
            let Some(layer) = state.history.current_layer().cloned() else {
                return Ok(PoseOutcome::Skipped(SkipReason::NoModel));
            };
            if index == state.pose_index {
                return Ok(PoseOutcome::Unchanged);
            }
            if layer.has_pose(instruction) {
                state.pose_index = index;
                debug!(pose = index, "pose cache hit");
                return Ok(PoseOutcome::CacheHit { pose_index: index });
            }
            let Some(reference) = layer.first_image() else {
                return Ok(PoseOutcome::Skipped(SkipReason::NoReference));
            };
            state.error = None;
            let previous = state.pose_index;
            state.pose_index = index;
            (layer, reference, previous, state.epoch)
        };

        permit.set_message("Changing pose...");
        let result = self.generator.vary_pose(&reference, instruction).await;

        match result {
            Ok(image) => {
                layer.insert_pose(instruction, image);
                if self.lock_state().epoch != epoch {
                    info!(pose = index, "pose result kept on detached layer: session changed");
                    return Ok(PoseOutcome::Discarded);
                }
                info!(pose = index, "pose generated");
                Ok(PoseOutcome::Generated { pose_index: index })
            }
            Err(source) => {
                let err = SessionError::pose(source);
                let mut state = self.lock_state();
                if state.epoch != epoch {
                    info!(pose = index, "pose failure ignored: session changed");
                    return Ok(PoseOutcome::Discarded);
                }
                state.pose_index = previous;
                state.error = Some(err.friendly_message());
                warn!(pose = index, rollback = previous, error = %err, "pose change failed");
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Saved outfits
    // -----------------------------------------------------------------------

    /// Snapshot the whole session and put it at the front of the saved
    /// list. Persist failures are logged; the outfit stays in the list.
    pub async fn save_outfit(&self) -> SaveOutcome {
        let Some(_permit) = self.gate.try_acquire() else {
            debug!("save rejected: generation in flight");
            return SaveOutcome::Skipped(SkipReason::Busy);
        };

        let outfit = {
            let state = self.lock_state();
            if state.history.is_empty() {
                return SaveOutcome::Skipped(SkipReason::NoModel);
            }
            if state.history.len() <= 1 {
                return SaveOutcome::Skipped(SkipReason::NothingToSave);
            }
            let Some(preview) = state.display_image() else {
                return SaveOutcome::Skipped(SkipReason::NoModel);
            };
            SavedOutfit::new(
                preview,
                state.history.snapshot_layers(),
                state.pose_index,
                state.history.current_index(),
            )
        };

        let id = outfit.id.clone();
        if let Err(e) = self.saved.lock().await.prepend(outfit).await {
            warn!(id = %id, error = %e, "saved outfit not persisted");
        }
        SaveOutcome::Saved { id }
    }

    /// Replace the live session with a copy of the saved outfit `id`.
    /// Returns `false` when no such outfit exists.
    pub async fn load_outfit(&self, id: &str) -> bool {
        let (history, pose_index) = {
            let saved = self.saved.lock().await;
            let Some(outfit) = saved.get(id) else {
                debug!(id = %id, "load ignored: unknown outfit");
                return false;
            };
            match outfit.to_history() {
                Ok(history) => (history, outfit.pose_index),
                Err(e) => {
                    warn!(id = %id, error = %e, "saved outfit cannot be loaded");
                    return false;
                }
            }
        };

        let mut state = self.lock_state();
        state.reset_to(history, pose_index);
        info!(id = %id, layer = state.history.current_index(), pose = pose_index, "outfit loaded");
        true
    }

    /// Remove the saved outfit `id`. Returns `false` when it did not exist.
    pub async fn delete_outfit(&self, id: &str) -> bool {
        match self.saved.lock().await.delete(id).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(id = %id, error = %e, "saved outfit deletion not persisted");
                true
            }
        }
    }

    /// Saved outfits, most recent first.
    pub async fn saved_outfits(&self) -> Vec<SavedOutfit> {
        self.saved.lock().await.list().to_vec()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn view(&self) -> SessionView {
        let state = self.lock_state();
        SessionView {
            display_image: state.display_image(),
            layer_index: state.history.current_index(),
            pose_index: state.pose_index,
            pose_instruction: state.pose_instruction(),
            history_len: state.history.len(),
            active_garment_ids: state.history.active_garment_ids(),
            available_poses: available_poses(&state),
            is_loading: self.gate.is_busy(),
            loading_message: self.gate.message(),
            error: state.error.clone(),
        }
    }

    /// Image for the current layer and pose, falling back to the layer's
    /// earliest cached image. `None` before [`Self::start`].
    pub fn display_image(&self) -> Option<ImageRef> {
        self.lock_state().display_image()
    }

    pub fn current_layer_index(&self) -> usize {
        self.lock_state().history.current_index()
    }

    pub fn current_pose_index(&self) -> usize {
        self.lock_state().pose_index
    }

    /// Total layers, retained tail included.
    pub fn history_len(&self) -> usize {
        self.lock_state().history.len()
    }

    pub fn layer(&self, index: usize) -> Option<Arc<OutfitLayer>> {
        self.lock_state().history.layer(index).cloned()
    }

    pub fn visible_layers(&self) -> Vec<Arc<OutfitLayer>> {
        self.lock_state().history.visible_layers().to_vec()
    }

    /// Pose instructions cached on the current layer, in insertion order.
    pub fn available_poses(&self) -> Vec<String> {
        available_poses(&self.lock_state())
    }

    pub fn active_garment_ids(&self) -> Vec<String> {
        self.lock_state().history.active_garment_ids()
    }

    pub fn wardrobe(&self) -> Vec<Garment> {
        self.lock_state().wardrobe.items().to_vec()
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn loading_message(&self) -> Option<String> {
        self.gate.message()
    }
}

fn available_poses(state: &SessionState) -> Vec<String> {
    state
        .history
        .current_layer()
        .map(|layer| layer.cached_poses())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;
    use fitcheck_store::MemoryListStore;

    /// Fails every call whose input contains "fail", otherwise tags it.
    struct Tagging;

    #[async_trait]
    impl ImageGenerator for Tagging {
        fn name(&self) -> &str {
            "tagging"
        }

        async fn apply_garment(
            &self,
            base: &ImageRef,
            garment: &Garment,
        ) -> Result<ImageRef, GenerationError> {
            if garment.id.contains("fail") {
                return Err(GenerationError::EmptyResponse);
            }
            Ok(ImageRef::new(format!("{base}+{}", garment.id)))
        }

        async fn vary_pose(
            &self,
            reference: &ImageRef,
            instruction: &str,
        ) -> Result<ImageRef, GenerationError> {
            if instruction.contains("Jumping") {
                return Err(GenerationError::Other("too dynamic".to_string()));
            }
            Ok(ImageRef::new(format!("{reference}@{instruction}")))
        }
    }

    async fn controller() -> SessionController {
        SessionController::new(Arc::new(Tagging), Arc::new(MemoryListStore::new())).await
    }

    fn garment(id: &str) -> Garment {
        Garment::new(id, id, format!("https://img/{id}.png"))
    }

    #[tokio::test]
    async fn requests_before_start_are_skipped() {
        let session = controller().await;

        assert_eq!(
            session.apply_garment(garment("tee")).await.unwrap(),
            ApplyOutcome::Skipped(SkipReason::NoModel)
        );
        assert_eq!(
            session.select_pose(1).await.unwrap(),
            PoseOutcome::Skipped(SkipReason::NoModel)
        );
        assert_eq!(
            session.save_outfit().await,
            SaveOutcome::Skipped(SkipReason::NoModel)
        );
        assert_eq!(session.display_image(), None);
    }

    #[tokio::test]
    async fn apply_commits_layer_and_wardrobe() {
        let session = controller().await;
        session.start(ImageRef::new("model"));

        let outcome = session.apply_garment(garment("scarf")).await.unwrap();

        assert_eq!(outcome, ApplyOutcome::Generated { layer_index: 1 });
        assert_eq!(session.display_image(), Some(ImageRef::new("model+scarf")));
        assert!(session.wardrobe().iter().any(|g| g.id == "scarf"));
        assert_eq!(session.active_garment_ids(), vec!["scarf".to_string()]);
        assert!(!session.is_loading());
        assert_eq!(session.loading_message(), None);
    }

    #[tokio::test]
    async fn failed_apply_sets_friendly_error() {
        let session = controller().await;
        session.start(ImageRef::new("model"));
        let wardrobe_before = session.wardrobe().len();

        let err = session.apply_garment(garment("fail-tee")).await.unwrap_err();

        assert!(matches!(err, SessionError::Generation { .. }));
        assert_eq!(session.history_len(), 1);
        assert_eq!(session.wardrobe().len(), wardrobe_before);
        assert!(session.error().unwrap().starts_with("Failed to apply garment."));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn pose_failure_rolls_back_pointer() {
        let session = controller().await;
        session.start(ImageRef::new("model"));

        let err = session.select_pose(3).await.unwrap_err();

        assert!(err.friendly_message().starts_with("Failed to change pose."));
        assert_eq!(session.current_pose_index(), 0);
        assert_eq!(session.layer(0).unwrap().pose_count(), 1);
    }

    #[tokio::test]
    async fn out_of_range_pose_is_an_error() {
        let session = controller().await;
        session.start(ImageRef::new("model"));

        let err = session.select_pose(POSE_COUNT).await.unwrap_err();

        assert!(matches!(err, SessionError::PoseOutOfRange { index, .. } if index == POSE_COUNT));
        assert_eq!(session.current_pose_index(), 0);
    }

    #[tokio::test]
    async fn view_reflects_state() {
        let session = controller().await;
        session.start(ImageRef::new("model"));
        session.select_pose(2).await.unwrap();

        let view = session.view();

        assert_eq!(view.pose_index, 2);
        assert_eq!(view.pose_instruction, POSE_INSTRUCTIONS[2]);
        assert_eq!(view.available_poses.len(), 2);
        assert_eq!(view.history_len, 1);
        assert!(view.error.is_none());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["layer_index"], 0);
    }

    #[tokio::test]
    async fn start_over_restores_default_wardrobe() {
        let session = controller().await;
        let defaults = session.wardrobe();
        session.start(ImageRef::new("model"));
        session.apply_garment(garment("scarf")).await.unwrap();

        session.start_over();

        assert_eq!(session.wardrobe(), defaults);
        assert_eq!(session.history_len(), 0);
        assert_eq!(session.display_image(), None);
    }
}
