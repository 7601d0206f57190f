// Mentorship Matching Engine - Core
//
// Scores mentor/mentee pairs, keeps a bounded set of fresh suggestions per
// mentor, and runs the two-sided consent lifecycle that turns a suggestion
// into a mentorship.
//
// Activities live per-domain in domains/*/activities/ and take `&ServerDeps`.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
