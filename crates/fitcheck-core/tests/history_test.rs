//! Garment application, reuse, branching and undo through the controller.

use fitcheck_core::{ApplyOutcome, GenerationError, ImageRef, POSE_COUNT, SessionController};
use fitcheck_test_utils::{GeneratorCall, ScriptedGenerator, garment, started_session};

fn assert_bounds(session: &SessionController) {
    let len = session.history_len();
    if len > 0 {
        assert!(session.current_layer_index() < len, "layer pointer out of bounds");
    }
    assert!(session.current_pose_index() < POSE_COUNT, "pose pointer out of bounds");
}

#[tokio::test]
async fn undo_reuse_then_branch_end_to_end() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator.clone()).await;
    assert_eq!(session.history_len(), 1);

    // Miss: one call, new layer.
    let outcome = session.apply_garment(garment("g1")).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Generated { layer_index: 1 });
    assert_eq!(session.history_len(), 2);
    assert_bounds(&session);

    // Undo keeps the layer.
    assert!(session.remove_last_garment());
    assert_eq!(session.current_layer_index(), 0);
    assert_eq!(session.history_len(), 2);
    assert_bounds(&session);

    // Hit: no call.
    let outcome = session.apply_garment(garment("g1")).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Reused { layer_index: 1 });
    assert_eq!(session.history_len(), 2);
    assert_eq!(generator.call_count(), 1);

    // Branch from the base: G2 replaces the G1 slot.
    session.remove_last_garment();
    let outcome = session.apply_garment(garment("g2")).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Generated { layer_index: 1 });
    assert_eq!(session.history_len(), 2);
    assert_eq!(session.current_layer_index(), 1);
    assert_eq!(session.layer(1).unwrap().garment_id(), Some("g2"));
    assert_eq!(generator.call_count(), 2);
    assert_bounds(&session);
}

#[tokio::test]
async fn discarded_tail_is_not_reusable() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator.clone()).await;

    session.apply_garment(garment("g1")).await.unwrap();
    session.remove_last_garment();
    session.apply_garment(garment("g2")).await.unwrap();
    session.remove_last_garment();

    let outcome = session.apply_garment(garment("g1")).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Generated { layer_index: 1 });
    assert_eq!(generator.call_count(), 3);
}

#[tokio::test]
async fn reuse_is_idempotent_from_same_start() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator.clone()).await;
    session.apply_garment(garment("g1")).await.unwrap();

    for _ in 0..3 {
        session.remove_last_garment();
        let outcome = session.apply_garment(garment("g1")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Reused { layer_index: 1 });
        assert_eq!(session.current_layer_index(), 1);
    }
    assert_eq!(generator.call_count(), 1);
    assert_eq!(session.history_len(), 2);
}

#[tokio::test]
async fn apply_uses_current_display_image_as_base() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator.clone()).await;

    session.apply_garment(garment("g1")).await.unwrap();
    session.apply_garment(garment("g2")).await.unwrap();

    assert_eq!(
        generator.calls()[1],
        GeneratorCall::ApplyGarment {
            base: ImageRef::new("model+g1"),
            garment_id: "g2".to_string(),
        }
    );
    assert_eq!(session.display_image(), Some(ImageRef::new("model+g1+g2")));
    assert_eq!(
        session.active_garment_ids(),
        vec!["g1".to_string(), "g2".to_string()]
    );
}

#[tokio::test]
async fn remove_at_base_is_noop() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator).await;

    assert!(!session.remove_last_garment());
    assert_eq!(session.current_layer_index(), 0);
    assert_bounds(&session);
}

#[tokio::test]
async fn undo_resets_pose_pointer() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator).await;
    session.apply_garment(garment("g1")).await.unwrap();
    session.select_pose(2).await.unwrap();

    session.remove_last_garment();

    assert_eq!(session.current_pose_index(), 0);
}

#[tokio::test]
async fn failed_apply_leaves_everything_unchanged() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator.clone()).await;
    session.apply_garment(garment("g1")).await.unwrap();
    session.remove_last_garment();
    let wardrobe_before = session.wardrobe();

    generator.push_failure(GenerationError::Blocked {
        reason: "SAFETY".to_string(),
    });
    let err = session.apply_garment(garment("g2")).await.unwrap_err();

    assert!(err.friendly_message().starts_with("Failed to apply garment."));
    assert_eq!(session.history_len(), 2);
    assert_eq!(session.current_layer_index(), 0);
    assert_eq!(session.layer(1).unwrap().garment_id(), Some("g1"));
    assert_eq!(session.wardrobe(), wardrobe_before);
    assert!(session.error().unwrap().contains("SAFETY"));
    assert!(!session.is_loading());
    assert_bounds(&session);

    // The retained tail survived the failure.
    let outcome = session.apply_garment(garment("g1")).await.unwrap();
    assert_eq!(outcome, ApplyOutcome::Reused { layer_index: 1 });
}

#[tokio::test]
async fn next_generation_clears_previous_error() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator.clone()).await;
    generator.push_failure(GenerationError::EmptyResponse);
    session.apply_garment(garment("g1")).await.unwrap_err();
    assert!(session.error().is_some());

    session.apply_garment(garment("g1")).await.unwrap();

    assert!(session.error().is_none());
}

#[tokio::test]
async fn wardrobe_gains_applied_garments_once() {
    let generator = ScriptedGenerator::new();
    let (session, _) = started_session(generator).await;
    let defaults = session.wardrobe().len();

    session.apply_garment(garment("g1")).await.unwrap();
    session.remove_last_garment();
    session.apply_garment(garment("g2")).await.unwrap();
    session.remove_last_garment();
    session.apply_garment(garment("g1")).await.unwrap();

    let wardrobe = session.wardrobe();
    assert_eq!(wardrobe.len(), defaults + 2);
    assert_eq!(wardrobe[defaults].id, "g1");
    assert_eq!(wardrobe[defaults + 1].id, "g2");
}
