//! Shared test utilities for fitcheck integration tests.
//!
//! Provides a [`ScriptedGenerator`] whose answers are queued by the test,
//! garment fixtures, and helpers that build a session over an in-memory or
//! temp-dir backed list store.
//!
//! Generated references are predictable when no outcome is queued:
//! - `apply_garment(base, g)` returns `"{base}+{g.id}"`
//! - `vary_pose(reference, instruction)` returns `"{reference}@pose{i}"`,
//!   where `i` is the catalog index of `instruction`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fitcheck_core::pose;
use fitcheck_core::{GenerationError, Garment, ImageGenerator, ImageRef, SessionController};
use fitcheck_store::{FileListStore, MemoryListStore};
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};

/// A call received by a [`ScriptedGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorCall {
    ApplyGarment { base: ImageRef, garment_id: String },
    VaryPose { reference: ImageRef, instruction: String },
}

/// An [`ImageGenerator`] driven entirely by the test.
///
/// Outcomes pushed with [`push_success`](Self::push_success) and
/// [`push_failure`](Self::push_failure) are consumed in order by calls of
/// either kind; once the queue is empty, calls succeed with a derived
/// reference. After [`hold`](Self::hold), every call blocks until
/// [`release_one`](Self::release_one) lets it through.
#[derive(Debug)]
pub struct ScriptedGenerator {
    outcomes: Mutex<VecDeque<Result<ImageRef, GenerationError>>>,
    calls: Mutex<Vec<GeneratorCall>>,
    held: AtomicBool,
    releases: Semaphore,
    call_made: Notify,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            held: AtomicBool::new(false),
            releases: Semaphore::new(0),
            call_made: Notify::new(),
        }
    }
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful result.
    pub fn push_success(&self, image: impl Into<ImageRef>) {
        self.lock_outcomes().push_back(Ok(image.into()));
    }

    /// Queue a failure.
    pub fn push_failure(&self, error: GenerationError) {
        self.lock_outcomes().push_back(Err(error));
    }

    /// Block every subsequent call until released.
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let one held call complete.
    pub fn release_one(&self) {
        self.releases.add_permits(1);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Wait until at least `n` calls have been received, giving up after
    /// five seconds.
    pub async fn wait_for_calls(&self, n: usize) {
        let wait = async {
            loop {
                // Created before the check so a call landing in between is
                // not missed.
                let notified = self.call_made.notified();
                if self.call_count() >= n {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(5), wait).await.is_err() {
            panic!("timed out waiting for {n} generator calls, saw {}", self.call_count());
        }
    }

    fn lock_outcomes(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<ImageRef, GenerationError>>> {
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn answer(
        &self,
        call: GeneratorCall,
        derived: ImageRef,
    ) -> Result<ImageRef, GenerationError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        self.call_made.notify_waiters();

        if self.held.load(Ordering::SeqCst) {
            match self.releases.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(GenerationError::Other("generator closed".to_string())),
            }
        }

        self.lock_outcomes().pop_front().unwrap_or(Ok(derived))
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn apply_garment(
        &self,
        base: &ImageRef,
        garment: &Garment,
    ) -> Result<ImageRef, GenerationError> {
        let derived = ImageRef::new(format!("{base}+{}", garment.id));
        let call = GeneratorCall::ApplyGarment {
            base: base.clone(),
            garment_id: garment.id.clone(),
        };
        self.answer(call, derived).await
    }

    async fn vary_pose(
        &self,
        reference: &ImageRef,
        instruction: &str,
    ) -> Result<ImageRef, GenerationError> {
        let index = pose::index_of(instruction).map_or(-1, |i| i as i64);
        let derived = ImageRef::new(format!("{reference}@pose{index}"));
        let call = GeneratorCall::VaryPose {
            reference: reference.clone(),
            instruction: instruction.to_string(),
        };
        self.answer(call, derived).await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Model image used by [`started_session`].
pub const MODEL_IMAGE: &str = "model";

/// A garment whose name and url are derived from `id`.
pub fn garment(id: &str) -> Garment {
    Garment::new(id, format!("Garment {id}"), format!("https://img/{id}.png"))
}

/// A session over `generator` and a fresh in-memory store, with the default
/// wardrobe and nothing started.
pub async fn memory_session(
    generator: Arc<ScriptedGenerator>,
) -> (SessionController, Arc<MemoryListStore>) {
    let backend = Arc::new(MemoryListStore::new());
    let session = SessionController::new(generator, backend.clone()).await;
    (session, backend)
}

/// Like [`memory_session`], already started on [`MODEL_IMAGE`].
pub async fn started_session(
    generator: Arc<ScriptedGenerator>,
) -> (SessionController, Arc<MemoryListStore>) {
    let (session, backend) = memory_session(generator).await;
    session.start(ImageRef::new(MODEL_IMAGE));
    (session, backend)
}

/// A file-backed list store in a fresh temp dir. Keep the `TempDir` alive
/// for as long as the store is used.
pub fn temp_file_store() -> (TempDir, Arc<FileListStore>) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = Arc::new(FileListStore::new(dir.path().join("data")));
    (dir, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_generator_answers_with_derived_refs() {
        let generator = ScriptedGenerator::default();

        let image = generator
            .apply_garment(&ImageRef::new("model"), &garment("g1"))
            .await
            .unwrap();

        assert_eq!(image, ImageRef::new("model+g1"));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn held_call_waits_for_release() {
        let generator = ScriptedGenerator::new();
        generator.hold();
        generator.push_success("front");

        let call = tokio::spawn({
            let generator = generator.clone();
            async move {
                generator
                    .vary_pose(&ImageRef::new("model"), pose::POSE_INSTRUCTIONS[1])
                    .await
            }
        });
        generator.wait_for_calls(1).await;
        assert!(!call.is_finished());

        generator.release_one();

        assert_eq!(call.await.unwrap().unwrap(), ImageRef::new("front"));
    }
}
