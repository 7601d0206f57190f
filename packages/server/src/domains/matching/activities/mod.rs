//! Matching activities - async entry points taking `&ServerDeps`.

pub mod establish_mentorship;
pub mod generate_suggestions;
pub mod lifecycle;
pub mod queries;
mod side_effects;

pub use establish_mentorship::establish_mentorship;
pub use generate_suggestions::{
    generate_suggestions_for_all_mentors, generate_suggestions_for_mentor, GenerationSummary,
    MentorRunOutcome, MentorRunSummary, SuggestionBatch,
};
pub use lifecycle::{
    mentee_accept_match, mentee_decline_match, mentor_accept_match, mentor_decline_match,
};
pub use queries::{
    get_match_for_actor, list_mentorships_for_mentee, list_mentorships_for_mentor,
    list_suggestions_for_mentee, list_suggestions_for_mentor,
};
