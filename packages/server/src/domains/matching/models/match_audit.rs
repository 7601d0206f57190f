use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use typed_builder::TypedBuilder;

use crate::common::{MatchAuditId, MatchRequestId, MemberId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_actor_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditActorRole {
    System,
    Mentor,
    Mentee,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Suggested,
    MentorAccept,
    MentorDecline,
    MenteeAccept,
    MenteeDecline,
    Connected,
    Expired,
}

/// The party a lifecycle action or lookup is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum MatchActor {
    Mentor(MemberId),
    Mentee(MemberId),
}

impl MatchActor {
    pub fn member_id(&self) -> MemberId {
        match self {
            MatchActor::Mentor(id) | MatchActor::Mentee(id) => *id,
        }
    }

    pub fn audit_role(&self) -> AuditActorRole {
        match self {
            MatchActor::Mentor(_) => AuditActorRole::Mentor,
            MatchActor::Mentee(_) => AuditActorRole::Mentee,
        }
    }
}

/// Request context forwarded by callers, recorded on audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
}

/// Append-only audit trail entry for a match request.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TypedBuilder)]
pub struct MatchAudit {
    #[builder(default = MatchAuditId::new())]
    pub id: MatchAuditId,
    pub match_request_id: MatchRequestId,
    #[builder(default, setter(strip_option))]
    pub actor_id: Option<MemberId>,
    pub actor_role: AuditActorRole,
    pub action: AuditAction,
    #[builder(default, setter(into))]
    pub reason: Option<String>,
    #[builder(default = serde_json::json!({}))]
    pub metadata: serde_json::Value,
    #[builder(default, setter(into))]
    pub ip_address: Option<String>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl MatchAudit {
    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO match_audits (
                id, match_request_id, actor_id, actor_role, action,
                reason, metadata, ip_address, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(self.match_request_id)
        .bind(self.actor_id)
        .bind(self.actor_role)
        .bind(self.action)
        .bind(&self.reason)
        .bind(&self.metadata)
        .bind(&self.ip_address)
        .bind(self.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_match_request(
        match_request_id: MatchRequestId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM match_audits WHERE match_request_id = $1 ORDER BY created_at ASC",
        )
        .bind(match_request_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
