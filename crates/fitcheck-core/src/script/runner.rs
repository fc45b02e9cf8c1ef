//! Drives a parsed [`SessionScript`] through a [`SessionController`].

use serde::Serialize;
use tracing::{debug, info};

use super::toml_format::{ScriptStep, SessionScript};
use crate::model::{Garment, ImageRef};
use crate::session::{ApplyOutcome, PoseOutcome, SaveOutcome, SessionController, SkipReason};

/// What one step did, with the session pointers after it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based step number.
    pub step: usize,
    pub action: String,
    pub outcome: String,
    pub layer_index: usize,
    pub pose_index: usize,
    pub display_image: Option<ImageRef>,
    /// Error surfaced by this step, if it failed.
    pub error: Option<String>,
}

/// Start `session` on the script's model image and run every step in order.
///
/// A failed generation is recorded in that step's report and the script
/// carries on, the same way a person would after seeing the error.
pub async fn run_script(session: &SessionController, script: &SessionScript) -> Vec<StepReport> {
    session.start(ImageRef::new(script.model_image.clone()));
    info!(steps = script.steps.len(), "replaying session script");

    let mut reports = Vec::with_capacity(script.steps.len());
    for (i, step) in script.steps.iter().enumerate() {
        let (outcome, error) = run_step(session, script, step).await;
        debug!(step = i + 1, action = %step, outcome = %outcome, "script step finished");
        reports.push(StepReport {
            step: i + 1,
            action: step.to_string(),
            outcome,
            layer_index: session.current_layer_index(),
            pose_index: session.current_pose_index(),
            display_image: session.display_image(),
            error,
        });
    }
    reports
}

async fn run_step(
    session: &SessionController,
    script: &SessionScript,
    step: &ScriptStep,
) -> (String, Option<String>) {
    match step {
        ScriptStep::Apply { garment } => {
            let Some(garment) = resolve_garment(session, script, garment) else {
                return (format!("unknown garment {garment}"), None);
            };
            match session.apply_garment(garment).await {
                Ok(ApplyOutcome::Reused { layer_index }) => {
                    (format!("reused layer {layer_index}"), None)
                }
                Ok(ApplyOutcome::Generated { layer_index }) => {
                    (format!("generated layer {layer_index}"), None)
                }
                Ok(ApplyOutcome::Skipped(reason)) => (skipped(reason), None),
                Ok(ApplyOutcome::Discarded) => ("discarded".to_string(), None),
                Err(e) => ("failed".to_string(), Some(e.friendly_message())),
            }
        }
        ScriptStep::Undo => {
            let outcome = if session.remove_last_garment() {
                "stepped back"
            } else {
                "already at base"
            };
            (outcome.to_string(), None)
        }
        ScriptStep::Pose { index } => match session.select_pose(*index).await {
            Ok(PoseOutcome::Unchanged) => ("unchanged".to_string(), None),
            Ok(PoseOutcome::CacheHit { pose_index }) => (format!("cached pose {pose_index}"), None),
            Ok(PoseOutcome::Generated { pose_index }) => {
                (format!("generated pose {pose_index}"), None)
            }
            Ok(PoseOutcome::Skipped(reason)) => (skipped(reason), None),
            Ok(PoseOutcome::Discarded) => ("discarded".to_string(), None),
            Err(e) => ("failed".to_string(), Some(e.friendly_message())),
        },
        ScriptStep::Save => match session.save_outfit().await {
            SaveOutcome::Saved { id } => (format!("saved {id}"), None),
            SaveOutcome::Skipped(reason) => (skipped(reason), None),
        },
        ScriptStep::Load { position } => match saved_id_at(session, *position).await {
            Some(id) if session.load_outfit(&id).await => (format!("loaded {id}"), None),
            Some(id) => (format!("could not load {id}"), None),
            None => (format!("no saved outfit at #{position}"), None),
        },
        ScriptStep::Delete { position } => match saved_id_at(session, *position).await {
            Some(id) => {
                session.delete_outfit(&id).await;
                (format!("deleted {id}"), None)
            }
            None => (format!("no saved outfit at #{position}"), None),
        },
        ScriptStep::StartOver => {
            // A script has one model image, so the fresh session starts on it.
            session.start_over();
            session.start(ImageRef::new(script.model_image.clone()));
            ("session reset".to_string(), None)
        }
    }
}

/// Script garments first, then whatever the session wardrobe holds now.
fn resolve_garment(session: &SessionController, script: &SessionScript, id: &str) -> Option<Garment> {
    script
        .garment(id)
        .cloned()
        .or_else(|| session.wardrobe().into_iter().find(|g| g.id == id))
}

async fn saved_id_at(session: &SessionController, position: usize) -> Option<String> {
    session
        .saved_outfits()
        .await
        .into_iter()
        .nth(position)
        .map(|outfit| outfit.id)
}

fn skipped(reason: SkipReason) -> String {
    let reason = match reason {
        SkipReason::Busy => "generation in flight",
        SkipReason::NoModel => "no model image",
        SkipReason::NothingToSave => "nothing to save",
        SkipReason::NoReference => "no reference image",
    };
    format!("skipped ({reason})")
}
