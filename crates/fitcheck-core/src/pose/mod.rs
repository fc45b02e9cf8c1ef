//! Pose catalog and per-layer pose cache.
//!
//! The catalog is a fixed, ordered list of human-readable pose
//! instructions. A pose index is a position in this list; the instruction
//! text itself is the cache key, so persisted caches stay meaningful to
//! anything that shares the same catalog.

mod cache;

pub use cache::PoseCache;

/// Pose instructions, in display order. Never reordered at runtime.
pub const POSE_INSTRUCTIONS: [&str; 6] = [
    "Full frontal view, hands on hips",
    "Slightly turned, 3/4 view",
    "Side profile view",
    "Jumping in the air, mid-action shot",
    "Walking towards camera",
    "Leaning against a wall",
];

/// Number of poses in the catalog.
pub const POSE_COUNT: usize = POSE_INSTRUCTIONS.len();

/// Instruction for the pose at `index`, if it is in range.
pub fn instruction(index: usize) -> Option<&'static str> {
    POSE_INSTRUCTIONS.get(index).copied()
}

/// Position of `instruction` in the catalog.
pub fn index_of(instruction: &str) -> Option<usize> {
    POSE_INSTRUCTIONS.iter().position(|p| *p == instruction)
}
