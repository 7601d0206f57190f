use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::MemberId;

/// Capacity assumed for mentors who never configured one.
pub const DEFAULT_MENTOR_CAPACITY: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Mentor,
    Mentee,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Mentee-declared priority. Profiles store either a number or a label
/// ("high", "urgent", "medium", "low").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenteePriority {
    Score(f64),
    Label(String),
}

/// Member profile - read by the matching engine.
///
/// Profiles are authored elsewhere (registration + application review).
/// Matching only ever writes `active_mentees_count`, and only through
/// `Mentorship::establish`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Member {
    #[builder(default = MemberId::new())]
    pub id: MemberId,
    #[builder(default)]
    pub full_name: String,
    pub role: MemberRole,
    #[builder(default = ApplicationStatus::Approved)]
    pub application_status: ApplicationStatus,

    #[builder(default, setter(strip_option))]
    pub program: Option<String>,
    /// Department or major
    #[builder(default, setter(strip_option))]
    pub department: Option<String>,

    // Tag lists (free-form, compared case-insensitively)
    #[builder(default)]
    pub expertise: Vec<String>,
    #[builder(default)]
    pub skills: Vec<String>,
    #[builder(default)]
    pub interests: Vec<String>,
    /// Declared available days ("monday", "tue", ...)
    #[builder(default)]
    pub availability: Vec<String>,

    #[builder(default, setter(strip_option))]
    pub priority: Option<Json<MenteePriority>>,

    // Mentor settings
    #[builder(default, setter(strip_option))]
    pub capacity: Option<i32>,
    #[builder(default, setter(strip_option))]
    pub active_mentees_count: Option<i32>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn is_approved_mentor(&self) -> bool {
        self.role == MemberRole::Mentor && self.application_status == ApplicationStatus::Approved
    }

    pub fn is_approved_mentee(&self) -> bool {
        self.role == MemberRole::Mentee && self.application_status == ApplicationStatus::Approved
    }

    pub fn effective_capacity(&self) -> i32 {
        self.capacity.unwrap_or(DEFAULT_MENTOR_CAPACITY)
    }

    pub fn effective_active_mentees(&self) -> i32 {
        self.active_mentees_count.unwrap_or(0)
    }

    pub fn priority(&self) -> Option<&MenteePriority> {
        self.priority.as_ref().map(|json| &json.0)
    }

    // =========================================================================
    // SQL
    // =========================================================================

    pub async fn find_by_id(id: MemberId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_ids(ids: &[MemberId], pool: &PgPool) -> Result<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Self>("SELECT * FROM members WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// All approved mentors, oldest first (stable batch order)
    pub async fn find_approved_mentors(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM members
             WHERE role = 'mentor' AND application_status = 'approved'
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Approved mentees not in `excluded`, capped at `limit`
    pub async fn find_approved_mentees_excluding(
        excluded: &[MemberId],
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM members
             WHERE role = 'mentee'
               AND application_status = 'approved'
               AND NOT (id = ANY($1))
             ORDER BY created_at DESC, id ASC
             LIMIT $2",
        )
        .bind(excluded)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_defaults_apply_when_unset() {
        let mentor = Member::builder().role(MemberRole::Mentor).build();
        assert_eq!(mentor.effective_capacity(), 3);
        assert_eq!(mentor.effective_active_mentees(), 0);
        assert!(mentor.is_approved_mentor());
        assert!(!mentor.is_approved_mentee());
    }

    #[test]
    fn pending_mentor_is_not_approved() {
        let mentor = Member::builder()
            .role(MemberRole::Mentor)
            .application_status(ApplicationStatus::Pending)
            .build();
        assert!(!mentor.is_approved_mentor());
    }

    #[test]
    fn priority_accepts_numbers_and_labels() {
        let numeric: MenteePriority = serde_json::from_str("72").unwrap();
        assert_eq!(numeric, MenteePriority::Score(72.0));

        let label: MenteePriority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(label, MenteePriority::Label("urgent".to_string()));
    }
}
