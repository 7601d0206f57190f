//! Mentor/mentee matching: scoring, suggestion generation and the match
//! request lifecycle through to an established mentorship.

pub mod activities;
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{ErrorBody, MatchError};
