//! Replay scripts: a session described as TOML and driven through a
//! [`crate::SessionController`].
//!
//! ```toml
//! model_image = "https://img/model.png"
//!
//! [[garments]]
//! id = "red-scarf"
//! name = "Red Scarf"
//! url = "https://img/red-scarf.png"
//!
//! [[steps]]
//! action = "apply"
//! garment = "red-scarf"
//!
//! [[steps]]
//! action = "pose"
//! index = 2
//!
//! [[steps]]
//! action = "save"
//! ```

pub mod parser;
pub mod runner;
pub mod toml_format;

pub use parser::{ScriptParseError, parse_session_script};
pub use runner::{StepReport, run_script};
pub use toml_format::{ScriptStep, SessionScript};
