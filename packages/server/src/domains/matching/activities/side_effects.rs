//! Best-effort audit and notification writes.
//!
//! Failures here are logged and swallowed; they never fail or roll back the
//! transition that triggered them.

use tracing::warn;

use crate::domains::matching::models::{MatchAudit, Notification};
use crate::kernel::ServerDeps;

pub async fn record_audit(deps: &ServerDeps, entry: MatchAudit) {
    let match_request_id = entry.match_request_id;
    let action = entry.action;

    if let Err(e) = deps.audit_log.append(entry).await {
        warn!(
            match_request_id = %match_request_id,
            action = ?action,
            error = %e,
            "Failed to append match audit entry"
        );
    }
}

pub async fn notify(deps: &ServerDeps, notification: Notification) {
    let user_id = notification.user_id;
    let kind = notification.kind;

    if let Err(e) = deps.notifications.send_notification(notification).await {
        warn!(
            user_id = %user_id,
            kind = ?kind,
            error = %e,
            "Failed to send notification"
        );
    }
}
