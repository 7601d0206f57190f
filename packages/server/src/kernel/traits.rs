// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Matching rules live in domains/matching; these traits only move rows.
//
// Naming convention: Base* for trait names (e.g., BaseMatchStore, BaseAuditLog)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{MatchRequestId, MemberId};
use crate::domains::matching::models::{
    CapacityGate, EstablishOutcome, MatchAudit, MatchRequest, MatchStatus, Mentorship, Notification,
    SuggestionUpsert, UpsertOutcome,
};
use crate::domains::member::models::Member;

// =============================================================================
// Profile Store Trait (Infrastructure - read side of member profiles)
// =============================================================================

#[async_trait]
pub trait BaseProfileStore: Send + Sync {
    async fn find_member(&self, id: MemberId) -> Result<Option<Member>>;

    async fn find_members(&self, ids: &[MemberId]) -> Result<Vec<Member>>;

    /// Approved mentors in a stable order
    async fn list_approved_mentors(&self) -> Result<Vec<Member>>;

    /// Approved mentees whose id is not in `excluded`, at most `limit` rows
    async fn list_approved_mentees_excluding(
        &self,
        excluded: &[MemberId],
        limit: usize,
    ) -> Result<Vec<Member>>;
}

// =============================================================================
// Match Store Trait (Infrastructure - match requests + mentorships)
// =============================================================================

#[async_trait]
pub trait BaseMatchStore: Send + Sync {
    async fn find_match(&self, id: MatchRequestId) -> Result<Option<MatchRequest>>;

    /// Lookup scoped to the owning mentor
    async fn find_match_for_mentor(
        &self,
        id: MatchRequestId,
        mentor_id: MemberId,
    ) -> Result<Option<MatchRequest>>;

    /// Lookup scoped to the owning mentee
    async fn find_match_for_mentee(
        &self,
        id: MatchRequestId,
        mentee_id: MemberId,
    ) -> Result<Option<MatchRequest>>;

    /// Mentees with a match request for this mentor, in any status
    async fn requested_mentee_ids(&self, mentor_id: MemberId) -> Result<Vec<MemberId>>;

    /// Mentees with a mentorship under this mentor, in any status
    async fn mentored_mentee_ids(&self, mentor_id: MemberId) -> Result<Vec<MemberId>>;

    /// Open (suggested / mentor_accepted / mentee_accepted) requests of a
    /// mentor that expire after `now`
    async fn list_open_matches_for_mentor(
        &self,
        mentor_id: MemberId,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchRequest>>;

    /// Requests of a mentor, best score first
    async fn list_matches_for_mentor(
        &self,
        mentor_id: MemberId,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRequest>>;

    /// Requests of a mentee, best score first
    async fn list_matches_for_mentee(
        &self,
        mentee_id: MemberId,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRequest>>;

    /// Insert or refresh the request keyed by (mentor_id, mentee_id).
    /// Refreshing never touches status.
    async fn upsert_suggestion(&self, suggestion: SuggestionUpsert) -> Result<UpsertOutcome>;

    /// Conditional status write. `None` when the stored status is no longer
    /// `expected`.
    async fn transition_status(
        &self,
        id: MatchRequestId,
        expected: MatchStatus,
        next: MatchStatus,
        note: Option<&str>,
    ) -> Result<Option<MatchRequest>>;

    /// Atomically connect the request (conditional on `expected`), insert its
    /// mentorship and increment the mentor's active mentee count. With
    /// `CapacityGate::Enforce` the increment also requires a free slot.
    async fn establish_mentorship(
        &self,
        id: MatchRequestId,
        expected: MatchStatus,
        note: Option<&str>,
        gate: CapacityGate,
    ) -> Result<EstablishOutcome>;

    /// Mentorships of a mentor, newest first
    async fn list_mentorships_for_mentor(&self, mentor_id: MemberId) -> Result<Vec<Mentorship>>;

    /// Mentorships of a mentee, newest first
    async fn list_mentorships_for_mentee(&self, mentee_id: MemberId) -> Result<Vec<Mentorship>>;
}

// =============================================================================
// Audit Log Trait (Infrastructure - append only)
// =============================================================================

#[async_trait]
pub trait BaseAuditLog: Send + Sync {
    async fn append(&self, entry: MatchAudit) -> Result<()>;
}

// =============================================================================
// Notification Trait (Infrastructure - fire and forget)
// =============================================================================

#[async_trait]
pub trait BaseNotificationService: Send + Sync {
    async fn send_notification(&self, notification: Notification) -> Result<()>;
}
