// Common types shared across the kernel and domain layers

pub mod entity_ids;
pub mod id;

pub use entity_ids::{
    MatchAuditId, MatchRequestId, MemberId, MentorshipId, NotificationId,
};
pub use id::Id;
