//! Image generation collaborators.
//!
//! The session never talks to an image model directly. It holds one
//! [`ImageGenerator`] and issues at most one call at a time through it:
//!
//! ```text
//! SessionController
//!     |
//!     v
//! GeneratorRegistry --get("offline")--> Arc<dyn ImageGenerator>
//!                                            |
//!     apply_garment(base, garment) ----------+--> ImageRef | GenerationError
//!     vary_pose(reference, instruction) -----+--> ImageRef | GenerationError
//! ```

pub mod offline;
pub mod registry;
pub mod trait_def;

pub use offline::OfflineGenerator;
pub use registry::GeneratorRegistry;
pub use trait_def::ImageGenerator;
