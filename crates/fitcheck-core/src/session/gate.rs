//! Single-flight loading gate.
//!
//! At most one generation call is outstanding per session. A second request
//! that arrives while a permit is held is rejected, never queued.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// The session's "generation in flight" flag plus its loading message.
#[derive(Debug, Default)]
pub struct LoadingGate {
    busy: AtomicBool,
    message: Mutex<Option<String>>,
}

/// Proof that the holder owns the gate. Dropping it clears the loading
/// message and reopens the gate.
#[derive(Debug)]
pub struct GenerationPermit<'a> {
    gate: &'a LoadingGate,
}

impl LoadingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate if it is open.
    pub fn try_acquire(&self) -> Option<GenerationPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// The message describing the call in flight, if any.
    pub fn message(&self) -> Option<String> {
        self.message
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl GenerationPermit<'_> {
    pub fn set_message(&self, message: impl Into<String>) {
        *self
            .gate
            .message
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(message.into());
    }
}

impl Drop for GenerationPermit<'_> {
    fn drop(&mut self) {
        self.gate
            .message
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.gate.busy.store(false, Ordering::Release);
    }
}
