//! Profile snapshots frozen onto a match request when it is (re)generated.
//!
//! Suggestion lists render from these, so later profile edits never change
//! what a mentor or mentee was shown for a given suggestion.

use serde::{Deserialize, Serialize};

use crate::common::MemberId;
use crate::domains::member::models::{Member, MenteePriority};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentorSnapshot {
    pub id: MemberId,
    pub full_name: String,
    pub program: Option<String>,
    pub department: Option<String>,
    pub expertise: Vec<String>,
    pub availability: Vec<String>,
    pub capacity: i32,
    pub active_mentees_count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenteeSnapshot {
    pub id: MemberId,
    pub full_name: String,
    pub program: Option<String>,
    pub department: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub availability: Vec<String>,
    pub priority: Option<MenteePriority>,
}

impl From<&Member> for MentorSnapshot {
    fn from(mentor: &Member) -> Self {
        Self {
            id: mentor.id,
            full_name: mentor.full_name.clone(),
            program: mentor.program.clone(),
            department: mentor.department.clone(),
            expertise: mentor.expertise.clone(),
            availability: mentor.availability.clone(),
            capacity: mentor.effective_capacity(),
            active_mentees_count: mentor.effective_active_mentees(),
        }
    }
}

impl From<&Member> for MenteeSnapshot {
    fn from(mentee: &Member) -> Self {
        Self {
            id: mentee.id,
            full_name: mentee.full_name.clone(),
            program: mentee.program.clone(),
            department: mentee.department.clone(),
            skills: mentee.skills.clone(),
            interests: mentee.interests.clone(),
            availability: mentee.availability.clone(),
            priority: mentee.priority().cloned(),
        }
    }
}
