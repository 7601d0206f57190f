use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MatchRequestId, MemberId, MentorshipId};
use crate::domains::matching::models::match_request::{MatchRequest, MatchStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "mentorship_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MentorshipStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Cancelled,
}

/// Long-lived relationship created once both parties accepted.
///
/// At most one per match request (unique `match_request_id`).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mentorship {
    pub id: MentorshipId,
    pub match_request_id: MatchRequestId,
    pub mentor_id: MemberId,
    pub mentee_id: MemberId,
    pub status: MentorshipStatus,
    pub metadata: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of committing a mutual acceptance.
#[derive(Debug, Clone)]
pub struct EstablishedMentorship {
    pub request: MatchRequest,
    pub mentorship: Mentorship,
}

/// How an attempt to commit a mutual acceptance ended.
#[derive(Debug, Clone)]
pub enum EstablishOutcome {
    Established(EstablishedMentorship),
    /// The request left the expected status first; nothing was written
    StatusChanged,
    /// Capacity-gated commit found the mentor full; nothing was written
    MentorAtCapacity { capacity: i32, active: i32 },
}

/// Whether the commit may push the mentor past capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityGate {
    /// Mentor decides: the increment only happens while a slot is free
    Enforce,
    /// Mentee decides: always increment
    Skip,
}

impl Mentorship {
    pub fn for_request(request: &MatchRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: MentorshipId::new(),
            match_request_id: request.id,
            mentor_id: request.mentor_id,
            mentee_id: request.mentee_id,
            status: MentorshipStatus::Active,
            metadata: serde_json::json!({}),
            started_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    /// Connect a request and start its mentorship in one transaction.
    ///
    /// Flips the request from `expected` to `connected`, bumps the mentor's
    /// `active_mentees_count` and inserts the mentorship. With
    /// `CapacityGate::Enforce` the bump is conditional on a free slot, so two
    /// concurrent mentor accepts cannot both take the last one. Any miss rolls
    /// the whole transaction back.
    pub async fn establish(
        request_id: MatchRequestId,
        expected: MatchStatus,
        note: Option<&str>,
        gate: CapacityGate,
        pool: &PgPool,
    ) -> Result<EstablishOutcome> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, MatchRequest>(
            r#"
            UPDATE match_requests
            SET status = 'connected',
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(expected)
        .bind(note)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Ok(EstablishOutcome::StatusChanged);
        };

        let bumped = sqlx::query(
            "UPDATE members
             SET active_mentees_count = COALESCE(active_mentees_count, 0) + 1,
                 updated_at = NOW()
             WHERE id = $1
               AND ($2 OR COALESCE(active_mentees_count, 0) < COALESCE(capacity, 3))",
        )
        .bind(request.mentor_id)
        .bind(gate == CapacityGate::Skip)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if bumped == 0 && gate == CapacityGate::Enforce {
            let (capacity, active) = sqlx::query_as::<_, (i32, i32)>(
                "SELECT COALESCE(capacity, 3), COALESCE(active_mentees_count, 0)
                 FROM members WHERE id = $1",
            )
            .bind(request.mentor_id)
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or((0, 0));
            tx.rollback().await?;
            return Ok(EstablishOutcome::MentorAtCapacity { capacity, active });
        }

        let mentorship = sqlx::query_as::<_, Mentorship>(
            r#"
            INSERT INTO mentorships (id, match_request_id, mentor_id, mentee_id, status, started_at)
            VALUES ($1, $2, $3, $4, 'active', NOW())
            RETURNING *
            "#,
        )
        .bind(MentorshipId::new())
        .bind(request.id)
        .bind(request.mentor_id)
        .bind(request.mentee_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(EstablishOutcome::Established(EstablishedMentorship {
            request,
            mentorship,
        }))
    }

    pub async fn find_by_match_request(
        match_request_id: MatchRequestId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM mentorships WHERE match_request_id = $1")
            .bind(match_request_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_mentor(mentor_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM mentorships WHERE mentor_id = $1 ORDER BY started_at DESC, id DESC",
        )
        .bind(mentor_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_mentee(mentee_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM mentorships WHERE mentee_id = $1 ORDER BY started_at DESC, id DESC",
        )
        .bind(mentee_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Mentees this mentor has ever been paired with
    pub async fn mentee_ids_for_mentor(mentor_id: MemberId, pool: &PgPool) -> Result<Vec<MemberId>> {
        sqlx::query_scalar::<_, MemberId>("SELECT mentee_id FROM mentorships WHERE mentor_id = $1")
            .bind(mentor_id)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
