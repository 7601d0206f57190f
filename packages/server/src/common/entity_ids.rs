//! Typed ids for every entity the matching engine touches.

pub use super::id::Id;

/// Marker for member profiles (mentors, mentees, admins).
pub struct Member;

/// Marker for scored mentor/mentee suggestions.
pub struct MatchRequest;

/// Marker for confirmed mentor/mentee relationships.
pub struct Mentorship;

/// Marker for append-only match audit entries.
pub struct MatchAudit;

/// Marker for recorded user notifications.
pub struct Notification;

pub type MemberId = Id<Member>;
pub type MatchRequestId = Id<MatchRequest>;
pub type MentorshipId = Id<Mentorship>;
pub type MatchAuditId = Id<MatchAudit>;
pub type NotificationId = Id<Notification>;
