//! The `ImageGenerator` trait -- the adapter interface for image models.

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::model::{Garment, ImageRef};

/// The two expensive operations a session depends on.
///
/// Implementations are free to take as long as they need; the session
/// guarantees it never has more than one call outstanding per controller.
///
/// # Object Safety
///
/// This trait is object-safe so a generator can be chosen at runtime and
/// stored as `Arc<dyn ImageGenerator>`.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Backend name (e.g. "offline").
    fn name(&self) -> &str;

    /// Render `garment` onto the person in `base`.
    async fn apply_garment(
        &self,
        base: &ImageRef,
        garment: &Garment,
    ) -> Result<ImageRef, GenerationError>;

    /// Re-render `reference` in the pose described by `instruction`.
    async fn vary_pose(
        &self,
        reference: &ImageRef,
        instruction: &str,
    ) -> Result<ImageRef, GenerationError>;
}

// Compile-time assertion: ImageGenerator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ImageGenerator) {}
};
