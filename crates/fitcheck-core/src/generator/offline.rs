//! Deterministic generator that never leaves the process.
//!
//! Each result is an `offline://` reference derived from a SHA-256 of the
//! call's inputs, so the same inputs always produce the same image and
//! different branches produce different ones.

use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::trait_def::ImageGenerator;
use crate::error::GenerationError;
use crate::model::{Garment, ImageRef};

/// Hex characters of the digest kept in each reference.
const DIGEST_CHARS: usize = 16;

/// An [`ImageGenerator`] with optional simulated latency.
#[derive(Debug, Clone, Default)]
pub struct OfflineGenerator {
    latency: Duration,
}

impl OfflineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn derive(kind: &str, parts: &[&str]) -> ImageRef {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    for part in parts {
        // Separator keeps ("ab", "c") and ("a", "bc") distinct.
        hasher.update([0u8]);
        hasher.update(part.as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    ImageRef::new(format!("offline://{kind}/{}", &digest[..DIGEST_CHARS]))
}

#[async_trait]
impl ImageGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn apply_garment(
        &self,
        base: &ImageRef,
        garment: &Garment,
    ) -> Result<ImageRef, GenerationError> {
        if base.as_str().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        self.simulate_latency().await;
        let image = derive("try-on", &[base.as_str(), &garment.id, garment.url.as_str()]);
        debug!(garment = %garment.id, image = %image, "offline try-on rendered");
        Ok(image)
    }

    async fn vary_pose(
        &self,
        reference: &ImageRef,
        instruction: &str,
    ) -> Result<ImageRef, GenerationError> {
        if reference.as_str().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        self.simulate_latency().await;
        let image = derive("pose", &[reference.as_str(), instruction]);
        debug!(pose = %instruction, image = %image, "offline pose rendered");
        Ok(image)
    }
}
