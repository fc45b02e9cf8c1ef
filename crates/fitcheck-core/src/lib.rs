//! Core of the fitcheck virtual try-on session.
//!
//! A session composes an outfit on a model image one garment at a time.
//! Every garment application and every pose change is an expensive call to
//! an [`ImageGenerator`]; this crate keeps that work structured so it is
//! never requested twice, never half-committed, and always rewindable:
//!
//! ```text
//! SessionController ──(gate: one call in flight)──> ImageGenerator
//!     │
//!     ├── OutfitHistory   [base, G1, G2, (retained tail...)]
//!     │        └── OutfitLayer ── PoseCache { pose -> image }
//!     ├── WardrobeSet     garments seen this session
//!     └── SavedOutfitStore ──> ListStore (durable JSON list)
//! ```

pub mod error;
pub mod generator;
pub mod history;
pub mod model;
pub mod pose;
pub mod saved;
pub mod script;
pub mod session;
pub mod wardrobe;

pub use error::{GenerationError, SessionError};
pub use generator::{GeneratorRegistry, ImageGenerator, OfflineGenerator};
pub use history::{LayerSnapshot, OutfitHistory, OutfitLayer, SnapshotError};
pub use model::{Garment, ImageRef};
pub use pose::{POSE_COUNT, POSE_INSTRUCTIONS, PoseCache};
pub use saved::{SAVED_OUTFITS_KEY, SavedOutfit, SavedOutfitStore};
pub use script::{ScriptParseError, SessionScript, StepReport, parse_session_script, run_script};
pub use session::{
    ApplyOutcome, PoseOutcome, SaveOutcome, SessionController, SessionView, SkipReason,
};
pub use wardrobe::WardrobeSet;
