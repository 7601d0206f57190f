//! Postgres adapters for the infrastructure traits.
//!
//! Each adapter is a thin wrapper around a `PgPool` that forwards to the SQL
//! living on the models.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{MatchRequestId, MemberId};
use crate::domains::matching::models::{
    CapacityGate, EstablishOutcome, MatchAudit, MatchRequest, MatchStatus, Mentorship, Notification,
    SuggestionUpsert, UpsertOutcome,
};
use crate::domains::member::models::Member;
use crate::kernel::{BaseAuditLog, BaseMatchStore, BaseNotificationService, BaseProfileStore};

// =============================================================================
// Profiles
// =============================================================================

pub struct PgProfileStore(pub PgPool);

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

#[async_trait]
impl BaseProfileStore for PgProfileStore {
    async fn find_member(&self, id: MemberId) -> Result<Option<Member>> {
        Member::find_by_id(id, &self.0).await
    }

    async fn find_members(&self, ids: &[MemberId]) -> Result<Vec<Member>> {
        Member::find_by_ids(ids, &self.0).await
    }

    async fn list_approved_mentors(&self) -> Result<Vec<Member>> {
        Member::find_approved_mentors(&self.0).await
    }

    async fn list_approved_mentees_excluding(
        &self,
        excluded: &[MemberId],
        limit: usize,
    ) -> Result<Vec<Member>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Member::find_approved_mentees_excluding(excluded, limit, &self.0).await
    }
}

// =============================================================================
// Match requests + mentorships
// =============================================================================

pub struct PgMatchStore(pub PgPool);

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

#[async_trait]
impl BaseMatchStore for PgMatchStore {
    async fn find_match(&self, id: MatchRequestId) -> Result<Option<MatchRequest>> {
        MatchRequest::find_by_id(id, &self.0).await
    }

    async fn find_match_for_mentor(
        &self,
        id: MatchRequestId,
        mentor_id: MemberId,
    ) -> Result<Option<MatchRequest>> {
        MatchRequest::find_for_mentor(id, mentor_id, &self.0).await
    }

    async fn find_match_for_mentee(
        &self,
        id: MatchRequestId,
        mentee_id: MemberId,
    ) -> Result<Option<MatchRequest>> {
        MatchRequest::find_for_mentee(id, mentee_id, &self.0).await
    }

    async fn requested_mentee_ids(&self, mentor_id: MemberId) -> Result<Vec<MemberId>> {
        MatchRequest::mentee_ids_for_mentor(mentor_id, &self.0).await
    }

    async fn mentored_mentee_ids(&self, mentor_id: MemberId) -> Result<Vec<MemberId>> {
        Mentorship::mentee_ids_for_mentor(mentor_id, &self.0).await
    }

    async fn list_open_matches_for_mentor(
        &self,
        mentor_id: MemberId,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchRequest>> {
        MatchRequest::find_open_for_mentor(mentor_id, now, &self.0).await
    }

    async fn list_matches_for_mentor(
        &self,
        mentor_id: MemberId,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRequest>> {
        MatchRequest::list_for_mentor(mentor_id, status, &self.0).await
    }

    async fn list_matches_for_mentee(
        &self,
        mentee_id: MemberId,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRequest>> {
        MatchRequest::list_for_mentee(mentee_id, status, &self.0).await
    }

    async fn upsert_suggestion(&self, suggestion: SuggestionUpsert) -> Result<UpsertOutcome> {
        MatchRequest::upsert_suggestion(suggestion, &self.0).await
    }

    async fn transition_status(
        &self,
        id: MatchRequestId,
        expected: MatchStatus,
        next: MatchStatus,
        note: Option<&str>,
    ) -> Result<Option<MatchRequest>> {
        MatchRequest::transition(id, expected, next, note, &self.0).await
    }

    async fn establish_mentorship(
        &self,
        id: MatchRequestId,
        expected: MatchStatus,
        note: Option<&str>,
        gate: CapacityGate,
    ) -> Result<EstablishOutcome> {
        Mentorship::establish(id, expected, note, gate, &self.0).await
    }

    async fn list_mentorships_for_mentor(&self, mentor_id: MemberId) -> Result<Vec<Mentorship>> {
        Mentorship::find_by_mentor(mentor_id, &self.0).await
    }

    async fn list_mentorships_for_mentee(&self, mentee_id: MemberId) -> Result<Vec<Mentorship>> {
        Mentorship::find_by_mentee(mentee_id, &self.0).await
    }
}

// =============================================================================
// Audit log
// =============================================================================

pub struct PgAuditLog(pub PgPool);

impl PgAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

#[async_trait]
impl BaseAuditLog for PgAuditLog {
    async fn append(&self, entry: MatchAudit) -> Result<()> {
        entry.insert(&self.0).await
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Persists notifications to the `notifications` table. Delivery to devices
/// happens downstream of that table.
pub struct PgNotificationSink(pub PgPool);

impl PgNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

#[async_trait]
impl BaseNotificationService for PgNotificationSink {
    async fn send_notification(&self, notification: Notification) -> Result<()> {
        notification.record(&self.0).await
    }
}
