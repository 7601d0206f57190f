use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use std::fmt;

use crate::common::{MatchRequestId, MemberId};
use crate::domains::matching::models::snapshot::{MenteeSnapshot, MentorSnapshot};
use crate::domains::matching::utils::ScoreBreakdown;

/// Match request status
///
/// ```text
/// suggested ─┬─► mentor_accepted ─► (mentee accepts) ─► connected
///            ├─► mentee_accepted ─► (mentor accepts) ─► connected
///            ├─► mentor_declined
///            ├─► mentee_declined
///            └─► expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "match_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Suggested,
    MentorAccepted,
    MenteeAccepted,
    MentorDeclined,
    MenteeDeclined,
    Connected,
    Expired,
    /// Set by admins outside this engine
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Suggested => "suggested",
            MatchStatus::MentorAccepted => "mentor_accepted",
            MatchStatus::MenteeAccepted => "mentee_accepted",
            MatchStatus::MentorDeclined => "mentor_declined",
            MatchStatus::MenteeDeclined => "mentee_declined",
            MatchStatus::Connected => "connected",
            MatchStatus::Expired => "expired",
            MatchStatus::Rejected => "rejected",
        }
    }

    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchStatus::Connected
                | MatchStatus::MentorDeclined
                | MatchStatus::MenteeDeclined
                | MatchStatus::Expired
                | MatchStatus::Rejected
        )
    }

    /// Still waiting on at least one party.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored, stateful suggestion pairing one mentor with one mentee.
///
/// Unique on (mentor_id, mentee_id). Never deleted; only transitioned.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchRequest {
    pub id: MatchRequestId,
    pub mentor_id: MemberId,
    pub mentee_id: MemberId,
    pub score: i32,
    pub score_breakdown: Json<ScoreBreakdown>,
    pub status: MatchStatus,
    pub mentor_snapshot: Json<MentorSnapshot>,
    pub mentee_snapshot: Json<MenteeSnapshot>,
    pub notes: Option<String>,
    pub metadata: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scored pair produced by a generation pass.
///
/// Upserting never carries a status: inserts get the column default
/// (`suggested`), updates leave the stored status alone.
#[derive(Debug, Clone)]
pub struct SuggestionUpsert {
    pub mentor_id: MemberId,
    pub mentee_id: MemberId,
    pub score: i32,
    pub breakdown: ScoreBreakdown,
    pub mentor_snapshot: MentorSnapshot,
    pub mentee_snapshot: MenteeSnapshot,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub request: MatchRequest,
    /// false when an existing row was refreshed
    pub inserted: bool,
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    request: MatchRequest,
    inserted: bool,
}

impl MatchRequest {
    /// Build the row an insert would produce (used by the in-memory store)
    pub fn from_suggestion(suggestion: SuggestionUpsert, now: DateTime<Utc>) -> Self {
        Self {
            id: MatchRequestId::new(),
            mentor_id: suggestion.mentor_id,
            mentee_id: suggestion.mentee_id,
            score: suggestion.score,
            score_breakdown: Json(suggestion.breakdown),
            status: MatchStatus::default(),
            mentor_snapshot: Json(suggestion.mentor_snapshot),
            mentee_snapshot: Json(suggestion.mentee_snapshot),
            notes: None,
            metadata: serde_json::json!({}),
            expires_at: suggestion.expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a refresh to an existing row. Status is deliberately untouched.
    pub fn refresh_from(&mut self, suggestion: SuggestionUpsert, now: DateTime<Utc>) {
        self.score = suggestion.score;
        self.score_breakdown = Json(suggestion.breakdown);
        self.mentor_snapshot = Json(suggestion.mentor_snapshot);
        self.mentee_snapshot = Json(suggestion.mentee_snapshot);
        self.expires_at = suggestion.expires_at;
        self.updated_at = now;
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    pub async fn find_by_id(id: MatchRequestId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM match_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Scoped lookup: only returns the row if `mentor_id` owns it
    pub async fn find_for_mentor(
        id: MatchRequestId,
        mentor_id: MemberId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM match_requests WHERE id = $1 AND mentor_id = $2")
            .bind(id)
            .bind(mentor_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Scoped lookup: only returns the row if `mentee_id` owns it
    pub async fn find_for_mentee(
        id: MatchRequestId,
        mentee_id: MemberId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM match_requests WHERE id = $1 AND mentee_id = $2")
            .bind(id)
            .bind(mentee_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Every mentee that already has a request with this mentor, any status
    pub async fn mentee_ids_for_mentor(mentor_id: MemberId, pool: &PgPool) -> Result<Vec<MemberId>> {
        sqlx::query_scalar::<_, MemberId>("SELECT mentee_id FROM match_requests WHERE mentor_id = $1")
            .bind(mentor_id)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Open requests of a mentor whose TTL has not run out yet
    pub async fn find_open_for_mentor(
        mentor_id: MemberId,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM match_requests
             WHERE mentor_id = $1
               AND status IN ('suggested', 'mentor_accepted', 'mentee_accepted')
               AND expires_at > $2
             ORDER BY score DESC, id ASC",
        )
        .bind(mentor_id)
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_mentor(
        mentor_id: MemberId,
        status: Option<MatchStatus>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM match_requests
             WHERE mentor_id = $1
               AND ($2::match_status IS NULL OR status = $2)
             ORDER BY score DESC, created_at DESC",
        )
        .bind(mentor_id)
        .bind(status)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_for_mentee(
        mentee_id: MemberId,
        status: Option<MatchStatus>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM match_requests
             WHERE mentee_id = $1
               AND ($2::match_status IS NULL OR status = $2)
             ORDER BY score DESC, created_at DESC",
        )
        .bind(mentee_id)
        .bind(status)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert a fresh suggestion or refresh an existing one.
    ///
    /// The update branch rewrites score, breakdown, snapshots and expiry only;
    /// `status` is not in the SET list, so progressed requests keep their state.
    /// `xmax = 0` is true only for rows created by this statement.
    pub async fn upsert_suggestion(suggestion: SuggestionUpsert, pool: &PgPool) -> Result<UpsertOutcome> {
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO match_requests (
                id, mentor_id, mentee_id, score, score_breakdown,
                mentor_snapshot, mentee_snapshot, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (mentor_id, mentee_id) DO UPDATE SET
                score = EXCLUDED.score,
                score_breakdown = EXCLUDED.score_breakdown,
                mentor_snapshot = EXCLUDED.mentor_snapshot,
                mentee_snapshot = EXCLUDED.mentee_snapshot,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(MatchRequestId::new())
        .bind(suggestion.mentor_id)
        .bind(suggestion.mentee_id)
        .bind(suggestion.score)
        .bind(Json(suggestion.breakdown))
        .bind(Json(suggestion.mentor_snapshot))
        .bind(Json(suggestion.mentee_snapshot))
        .bind(suggestion.expires_at)
        .fetch_one(pool)
        .await?;

        Ok(UpsertOutcome {
            request: row.request,
            inserted: row.inserted,
        })
    }

    /// Move `id` from `expected` to `next`.
    ///
    /// Returns `None` when the stored status is no longer `expected` (another
    /// request got there first). `note` only overwrites when provided.
    pub async fn transition(
        id: MatchRequestId,
        expected: MatchStatus,
        next: MatchStatus,
        note: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE match_requests
            SET status = $3,
                notes = COALESCE($4, notes),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .bind(note)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
