//! Profile fixtures.

use mentorship_core::domains::member::models::{ApplicationStatus, Member, MemberRole};

pub fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Approved mentor with unset capacity (3) and no active mentees
pub fn approved_mentor(name: &str) -> Member {
    Member::builder()
        .full_name(name)
        .role(MemberRole::Mentor)
        .program("Computer Science")
        .department("Engineering")
        .expertise(tags(&["python", "ml", "data"]))
        .interests(tags(&["open source"]))
        .availability(tags(&["monday", "wednesday"]))
        .build()
}

/// Approved mentor with explicit capacity settings
pub fn mentor_with_capacity(name: &str, capacity: i32, active: i32) -> Member {
    let mut mentor = approved_mentor(name);
    mentor.capacity = Some(capacity);
    mentor.active_mentees_count = Some(active);
    mentor
}

/// Approved mentee sharing `skills` with the default mentor's expertise
pub fn approved_mentee(name: &str, skills: &[&str]) -> Member {
    Member::builder()
        .full_name(name)
        .role(MemberRole::Mentee)
        .program("Computer Science")
        .skills(tags(skills))
        .availability(tags(&["monday"]))
        .build()
}

pub fn pending_member(name: &str, role: MemberRole) -> Member {
    Member::builder()
        .full_name(name)
        .role(role)
        .application_status(ApplicationStatus::Pending)
        .build()
}
