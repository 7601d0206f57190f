pub mod member;

pub use member::{ApplicationStatus, Member, MemberRole, MenteePriority, DEFAULT_MENTOR_CAPACITY};
