//! TOML format types for session replay scripts.

use serde::{Deserialize, Serialize};

use crate::model::Garment;

/// Top-level structure of a replay script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionScript {
    /// Model image the session starts from.
    pub model_image: String,
    /// Garments available to `apply` steps in addition to the wardrobe.
    #[serde(default)]
    pub garments: Vec<Garment>,
    /// Actions, run in order.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// A single `[[steps]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Apply the garment with this id.
    Apply { garment: String },
    /// Remove the last garment.
    Undo,
    /// Select the pose at this catalog index.
    Pose { index: usize },
    Save,
    /// Load the saved outfit at this position (0 is the most recent).
    Load { position: usize },
    /// Delete the saved outfit at this position (0 is the most recent).
    Delete { position: usize },
    /// Reset the session and start again on the script's model image.
    StartOver,
}

impl SessionScript {
    /// Find a garment declared in the script.
    pub fn garment(&self, id: &str) -> Option<&Garment> {
        self.garments.iter().find(|g| g.id == id)
    }
}

impl std::fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apply { garment } => write!(f, "apply {garment}"),
            Self::Undo => f.write_str("undo"),
            Self::Pose { index } => write!(f, "pose {index}"),
            Self::Save => f.write_str("save"),
            Self::Load { position } => write!(f, "load #{position}"),
            Self::Delete { position } => write!(f, "delete #{position}"),
            Self::StartOver => f.write_str("start over"),
        }
    }
}
