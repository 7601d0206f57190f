pub mod match_audit;
pub mod match_request;
pub mod mentorship;
pub mod notification;
pub mod snapshot;

pub use match_audit::{AuditAction, AuditActorRole, MatchActor, MatchAudit, RequestMeta};
pub use match_request::{MatchRequest, MatchStatus, SuggestionUpsert, UpsertOutcome};
pub use mentorship::{
    CapacityGate, EstablishOutcome, EstablishedMentorship, Mentorship, MentorshipStatus,
};
pub use notification::{Notification, NotificationType};
pub use snapshot::{MenteeSnapshot, MentorSnapshot};
