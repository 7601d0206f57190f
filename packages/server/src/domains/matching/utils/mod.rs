//! Pure matching logic - no I/O, no side effects.

pub mod capacity;
pub mod scoring;

pub use capacity::ensure_mentor_capacity;
pub use scoring::{calculate_score, ScoreBreakdown, ScoreResult};
