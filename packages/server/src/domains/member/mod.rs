//! Member domain - the profile records matching reads
//!
//! Profiles are authored by registration and application review; this crate
//! only reads them, apart from the mentor capacity counter.

pub mod models;

pub use models::{ApplicationStatus, Member, MemberRole, MenteePriority};
