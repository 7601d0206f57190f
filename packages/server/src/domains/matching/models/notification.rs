use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MemberId, NotificationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    MatchSuggestion,
    MatchResponse,
    MatchConfirmed,
    MatchDeclined,
}

/// User-facing notification about a match request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: MemberId,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: MemberId,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            data,
            created_at: Utc::now(),
        }
    }

    /// Record a notification (ignores replays of the same id)
    pub async fn record(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, user_id, type, title, message, data, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(self.kind)
        .bind(&self.title)
        .bind(&self.message)
        .bind(&self.data)
        .bind(self.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Find all notifications for a member, newest first
    pub async fn find_by_user(user_id: MemberId, pool: &PgPool) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&NotificationType::MatchSuggestion).unwrap();
        assert_eq!(json, "\"MATCH_SUGGESTION\"");
    }

    #[test]
    fn notification_serializes_kind_as_type() {
        let notification = Notification::new(
            MemberId::new(),
            NotificationType::MatchConfirmed,
            "Mentorship confirmed",
            "You are now connected",
            serde_json::json!({}),
        );
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "MATCH_CONFIRMED");
    }
}
