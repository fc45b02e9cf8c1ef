//! Replay script parser with validation.
//!
//! Parses a script string into a [`SessionScript`] and validates:
//! - The model image is non-empty and there is at least one step.
//! - Script garment ids are unique and do not shadow wardrobe garments.
//! - `apply` steps name a known garment.
//! - `pose` steps are within the pose catalog.

use std::collections::HashSet;

use thiserror::Error;

use super::toml_format::{ScriptStep, SessionScript};
use crate::pose::POSE_COUNT;
use crate::wardrobe::WardrobeSet;

/// Errors that can occur during script parsing and validation.
#[derive(Debug, Error)]
pub enum ScriptParseError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("script must contain at least one step")]
    NoSteps,

    #[error("model_image must not be empty")]
    EmptyModelImage,

    #[error("duplicate garment id: {0:?}")]
    DuplicateGarment(String),

    #[error("step {step} applies unknown garment {garment:?}")]
    UnknownGarment { step: usize, garment: String },

    #[error("step {step} selects pose {index}, which is outside the pose catalog")]
    PoseOutOfRange { step: usize, index: usize },
}

/// Parse and validate a replay script against `wardrobe`.
pub fn parse_session_script(
    content: &str,
    wardrobe: &WardrobeSet,
) -> Result<SessionScript, ScriptParseError> {
    let script: SessionScript = toml::from_str(content)?;
    validate(&script, wardrobe)?;
    Ok(script)
}

fn validate(script: &SessionScript, wardrobe: &WardrobeSet) -> Result<(), ScriptParseError> {
    if script.model_image.trim().is_empty() {
        return Err(ScriptParseError::EmptyModelImage);
    }
    if script.steps.is_empty() {
        return Err(ScriptParseError::NoSteps);
    }

    let mut known: HashSet<&str> = wardrobe.items().iter().map(|g| g.id.as_str()).collect();
    for garment in &script.garments {
        if !known.insert(garment.id.as_str()) {
            return Err(ScriptParseError::DuplicateGarment(garment.id.clone()));
        }
    }

    // Steps are numbered from 1 in errors, matching how people read a script.
    for (i, step) in script.steps.iter().enumerate() {
        let step_no = i + 1;
        match step {
            ScriptStep::Apply { garment } if !known.contains(garment.as_str()) => {
                return Err(ScriptParseError::UnknownGarment {
                    step: step_no,
                    garment: garment.clone(),
                });
            }
            ScriptStep::Pose { index } if *index >= POSE_COUNT => {
                return Err(ScriptParseError::PoseOutOfRange {
                    step: step_no,
                    index: *index,
                });
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Garment;

    fn wardrobe() -> WardrobeSet {
        WardrobeSet::new(vec![Garment::new("tee", "Tee", "https://img/tee.png")])
    }

    const VALID: &str = r#"
model_image = "https://img/model.png"

[[garments]]
id = "scarf"
name = "Scarf"
url = "https://img/scarf.png"

[[steps]]
action = "apply"
garment = "tee"

[[steps]]
action = "apply"
garment = "scarf"

[[steps]]
action = "undo"

[[steps]]
action = "pose"
index = 5

[[steps]]
action = "save"

[[steps]]
action = "load"
position = 0

[[steps]]
action = "delete"
position = 0

[[steps]]
action = "start_over"
"#;

    #[test]
    fn parses_every_step_kind() {
        let script = parse_session_script(VALID, &wardrobe()).unwrap();

        assert_eq!(script.steps.len(), 8);
        assert_eq!(script.steps[2], ScriptStep::Undo);
        assert_eq!(script.steps[3], ScriptStep::Pose { index: 5 });
        assert_eq!(script.steps[7], ScriptStep::StartOver);
        assert_eq!(script.garment("scarf").unwrap().name, "Scarf");
    }

    #[test]
    fn rejects_missing_steps() {
        let err = parse_session_script(r#"model_image = "m""#, &wardrobe()).unwrap_err();
        assert!(matches!(err, ScriptParseError::NoSteps));
    }

    #[test]
    fn rejects_blank_model_image() {
        let content = "model_image = \" \"\n[[steps]]\naction = \"undo\"\n";
        let err = parse_session_script(content, &wardrobe()).unwrap_err();
        assert!(matches!(err, ScriptParseError::EmptyModelImage));
    }

    #[test]
    fn rejects_unknown_garment_with_step_number() {
        let content = r#"
model_image = "m"
[[steps]]
action = "undo"
[[steps]]
action = "apply"
garment = "cape"
"#;
        let err = parse_session_script(content, &wardrobe()).unwrap_err();
        match err {
            ScriptParseError::UnknownGarment { step, garment } => {
                assert_eq!(step, 2);
                assert_eq!(garment, "cape");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_garment_shadowing_wardrobe() {
        let content = r#"
model_image = "m"
[[garments]]
id = "tee"
name = "Other Tee"
url = "u"
[[steps]]
action = "undo"
"#;
        let err = parse_session_script(content, &wardrobe()).unwrap_err();
        assert!(matches!(err, ScriptParseError::DuplicateGarment(id) if id == "tee"));
    }

    #[test]
    fn rejects_pose_out_of_range() {
        let content = "model_image = \"m\"\n[[steps]]\naction = \"pose\"\nindex = 6\n";
        let err = parse_session_script(content, &wardrobe()).unwrap_err();
        assert!(matches!(
            err,
            ScriptParseError::PoseOutOfRange { step: 1, index: 6 }
        ));
    }

    #[test]
    fn rejects_unknown_action() {
        let content = "model_image = \"m\"\n[[steps]]\naction = \"teleport\"\n";
        let err = parse_session_script(content, &wardrobe()).unwrap_err();
        assert!(matches!(err, ScriptParseError::TomlError(_)));
    }
}
