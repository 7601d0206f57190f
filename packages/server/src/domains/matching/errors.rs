use serde::Serialize;
use thiserror::Error;

use crate::domains::matching::models::MatchStatus;

/// Errors raised by the matching engine.
///
/// Each variant maps to a `{status, code, message}` triple the HTTP layer
/// renders as-is; the engine never builds transport responses itself.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Mentor is not available for matching")]
    MentorNotAvailable,

    #[error("Match request not found")]
    MatchNotFound,

    #[error("Match request can no longer be actioned (status: {status})")]
    MatchNotActionable { status: MatchStatus },

    #[error("Match suggestion has expired")]
    MatchExpired,

    #[error("Mentor has reached capacity ({active}/{capacity} active mentees)")]
    MentorCapacityReached { capacity: i32, active: i32 },

    #[error("Match request changed while it was being updated, please retry")]
    MatchStateConflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Transport-neutral error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

impl MatchError {
    pub fn status_code(&self) -> u16 {
        match self {
            MatchError::MentorNotAvailable | MatchError::MatchNotFound => 404,
            MatchError::MatchNotActionable { .. }
            | MatchError::MatchExpired
            | MatchError::MentorCapacityReached { .. }
            | MatchError::MatchStateConflict => 409,
            MatchError::Database(_) | MatchError::Internal(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchError::MentorNotAvailable => "MENTOR_NOT_AVAILABLE",
            MatchError::MatchNotFound => "MATCH_NOT_FOUND",
            MatchError::MatchNotActionable { .. } => "MATCH_NOT_ACTIONABLE",
            MatchError::MatchExpired => "MATCH_EXPIRED",
            MatchError::MentorCapacityReached { .. } => "MENTOR_CAPACITY_REACHED",
            MatchError::MatchStateConflict => "MATCH_STATE_CONFLICT",
            MatchError::Database(_) | MatchError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Internal failure details stay in the logs, not in the payload.
    pub fn to_error_body(&self) -> ErrorBody {
        let message = match self {
            MatchError::Database(_) | MatchError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        ErrorBody {
            status: self.status_code(),
            code: self.code(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_error_is_a_conflict() {
        let err = MatchError::MentorCapacityReached {
            capacity: 2,
            active: 2,
        };
        let body = err.to_error_body();
        assert_eq!(body.status, 409);
        assert_eq!(body.code, "MENTOR_CAPACITY_REACHED");
        assert!(body.message.contains("2/2"));
    }

    #[test]
    fn not_actionable_names_the_status() {
        let err = MatchError::MatchNotActionable {
            status: MatchStatus::Connected,
        };
        assert_eq!(err.code(), "MATCH_NOT_ACTIONABLE");
        assert!(err.to_string().contains("connected"));
    }

    #[test]
    fn missing_records_are_not_found() {
        assert_eq!(MatchError::MatchNotFound.status_code(), 404);
        assert_eq!(MatchError::MentorNotAvailable.status_code(), 404);
        assert_eq!(MatchError::MatchExpired.status_code(), 409);
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = MatchError::from(anyhow::anyhow!("connection reset by peer"));
        let body = err.to_error_body();
        assert_eq!(body.status, 500);
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("connection reset"));
    }
}
