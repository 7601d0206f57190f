//! Match request lifecycle: accept / decline by either party.
//!
//! ```text
//!                  mentor accept (capacity gated)       mentee accept
//!   suggested ──────────────────► mentor_accepted ───────────────────┐
//!       │                                                            ▼
//!       │          mentee accept                  mentor accept  connected
//!       ├─────────────────────────► mentee_accepted ─────────────────▲
//!       │
//!       ├─► mentor_declined / mentee_declined   (from any open status)
//!       └─► expired                             (lazily, on first action past TTL)
//! ```
//!
//! Every write is conditional on the status the action was decided against.
//! When a concurrent request moved the record first, the action reloads and
//! decides again, giving up after a few attempts.

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::common::{MatchRequestId, MemberId};
use crate::domains::matching::activities::establish_mentorship::establish_mentorship;
use crate::domains::matching::activities::queries::get_match_for_actor;
use crate::domains::matching::activities::side_effects::{notify, record_audit};
use crate::domains::matching::errors::MatchError;
use crate::domains::matching::models::{
    AuditAction, AuditActorRole, MatchActor, MatchAudit, MatchRequest, MatchStatus, Notification,
    NotificationType, RequestMeta,
};
use crate::domains::matching::utils::ensure_mentor_capacity;
use crate::kernel::ServerDeps;

/// Attempts at a conditional write before reporting a conflict.
pub const MAX_TRANSITION_ATTEMPTS: usize = 3;

/// Mentor accepts a suggestion. Connects immediately if the mentee already
/// accepted. Fails with `MentorCapacityReached` when the mentor is full, either
/// up front or when the connecting commit finds the last slot taken.
#[instrument(skip(note, meta, deps), fields(match_request_id = %match_id, mentor_id = %mentor_id))]
pub async fn mentor_accept_match(
    match_id: MatchRequestId,
    mentor_id: MemberId,
    note: Option<String>,
    meta: RequestMeta,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    accept(MatchActor::Mentor(mentor_id), match_id, note.as_deref(), &meta, deps).await
}

/// Mentee accepts a suggestion. Connects immediately if the mentor already
/// accepted. Never capacity gated.
#[instrument(skip(meta, deps), fields(match_request_id = %match_id, mentee_id = %mentee_id))]
pub async fn mentee_accept_match(
    match_id: MatchRequestId,
    mentee_id: MemberId,
    meta: RequestMeta,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    accept(MatchActor::Mentee(mentee_id), match_id, None, &meta, deps).await
}

#[instrument(skip(reason, meta, deps), fields(match_request_id = %match_id, mentor_id = %mentor_id))]
pub async fn mentor_decline_match(
    match_id: MatchRequestId,
    mentor_id: MemberId,
    reason: Option<String>,
    meta: RequestMeta,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    decline(MatchActor::Mentor(mentor_id), match_id, reason, &meta, deps).await
}

#[instrument(skip(reason, meta, deps), fields(match_request_id = %match_id, mentee_id = %mentee_id))]
pub async fn mentee_decline_match(
    match_id: MatchRequestId,
    mentee_id: MemberId,
    reason: Option<String>,
    meta: RequestMeta,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    decline(MatchActor::Mentee(mentee_id), match_id, reason, &meta, deps).await
}

// =============================================================================
// Shared flow
// =============================================================================

fn accepted_status(actor: MatchActor) -> MatchStatus {
    match actor {
        MatchActor::Mentor(_) => MatchStatus::MentorAccepted,
        MatchActor::Mentee(_) => MatchStatus::MenteeAccepted,
    }
}

/// Status meaning the other party already said yes
fn counterpart_accepted_status(actor: MatchActor) -> MatchStatus {
    match actor {
        MatchActor::Mentor(_) => MatchStatus::MenteeAccepted,
        MatchActor::Mentee(_) => MatchStatus::MentorAccepted,
    }
}

fn declined_status(actor: MatchActor) -> MatchStatus {
    match actor {
        MatchActor::Mentor(_) => MatchStatus::MentorDeclined,
        MatchActor::Mentee(_) => MatchStatus::MenteeDeclined,
    }
}

fn counterpart_id(actor: MatchActor, request: &MatchRequest) -> MemberId {
    match actor {
        MatchActor::Mentor(_) => request.mentee_id,
        MatchActor::Mentee(_) => request.mentor_id,
    }
}

/// Display name of the acting party, from the frozen snapshots
fn actor_name(actor: MatchActor, request: &MatchRequest) -> &str {
    match actor {
        MatchActor::Mentor(_) => &request.mentor_snapshot.full_name,
        MatchActor::Mentee(_) => &request.mentee_snapshot.full_name,
    }
}

/// Scoped load + lazy expiry + terminal check.
async fn load_actionable(
    actor: MatchActor,
    match_id: MatchRequestId,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    let request = get_match_for_actor(match_id, actor, deps).await?;
    let request = expire_if_due(request, actor, deps).await?;

    if request.status.is_terminal() {
        return Err(MatchError::MatchNotActionable {
            status: request.status,
        });
    }

    Ok(request)
}

/// An already expired request fails straight away. An open request past its
/// expiry is persisted as expired first, then fails.
async fn expire_if_due(
    request: MatchRequest,
    actor: MatchActor,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    if request.status == MatchStatus::Expired {
        return Err(MatchError::MatchExpired);
    }

    if !request.status.is_open() || !request.is_past_expiry(Utc::now()) {
        return Ok(request);
    }

    let expired = deps
        .matches
        .transition_status(request.id, request.status, MatchStatus::Expired, None)
        .await?;

    match expired {
        Some(expired) => {
            info!(
                match_request_id = %expired.id,
                previous_status = %request.status,
                "Match request expired"
            );
            record_audit(
                deps,
                MatchAudit::builder()
                    .match_request_id(expired.id)
                    .actor_role(AuditActorRole::System)
                    .action(AuditAction::Expired)
                    .metadata(serde_json::json!({
                        "previous_status": request.status,
                        "expires_at": request.expires_at,
                        "observed_by": actor,
                    }))
                    .build(),
            )
            .await;
        }
        None => {
            debug!(match_request_id = %request.id, "Request changed before expiry was persisted");
        }
    }

    Err(MatchError::MatchExpired)
}

async fn accept(
    actor: MatchActor,
    match_id: MatchRequestId,
    note: Option<&str>,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
        let request = load_actionable(actor, match_id, deps).await?;

        if let MatchActor::Mentor(mentor_id) = actor {
            let mentor = deps
                .profiles
                .find_member(mentor_id)
                .await?
                .ok_or(MatchError::MentorNotAvailable)?;
            ensure_mentor_capacity(&mentor)?;
        }

        if request.status == accepted_status(actor) {
            debug!(status = %request.status, "Already accepted by this party");
            return Ok(request);
        }

        if request.status == counterpart_accepted_status(actor) {
            let expected = request.status;
            if let Some(established) =
                establish_mentorship(&request, expected, actor, note, meta, deps).await?
            {
                record_accept_audit(actor, &established.request, expected, note, meta, deps).await;
                return Ok(established.request);
            }
        } else if let Some(updated) = deps
            .matches
            .transition_status(request.id, request.status, accepted_status(actor), note)
            .await?
        {
            info!(status = %updated.status, "Match request accepted");

            let counterpart = counterpart_id(actor, &updated);
            notify(
                deps,
                Notification::new(
                    counterpart,
                    NotificationType::MatchResponse,
                    "Your match was accepted",
                    format!(
                        "{} accepted your match suggestion. Accept it too to start the mentorship.",
                        actor_name(actor, &updated)
                    ),
                    serde_json::json!({
                        "match_request_id": updated.id,
                        "status": updated.status,
                        "note": note,
                    }),
                ),
            )
            .await;

            record_accept_audit(actor, &updated, request.status, note, meta, deps).await;
            return Ok(updated);
        }

        debug!(attempt, "Match request changed concurrently, reloading");
    }

    Err(MatchError::MatchStateConflict)
}

async fn record_accept_audit(
    actor: MatchActor,
    request: &MatchRequest,
    previous: MatchStatus,
    note: Option<&str>,
    meta: &RequestMeta,
    deps: &ServerDeps,
) {
    let action = match actor {
        MatchActor::Mentor(_) => AuditAction::MentorAccept,
        MatchActor::Mentee(_) => AuditAction::MenteeAccept,
    };

    record_audit(
        deps,
        MatchAudit::builder()
            .match_request_id(request.id)
            .actor_id(actor.member_id())
            .actor_role(actor.audit_role())
            .action(action)
            .metadata(serde_json::json!({
                "previous_status": previous,
                "note": note,
            }))
            .ip_address(meta.ip_address.clone())
            .build(),
    )
    .await;
}

async fn decline(
    actor: MatchActor,
    match_id: MatchRequestId,
    reason: Option<String>,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
        let request = load_actionable(actor, match_id, deps).await?;

        let Some(updated) = deps
            .matches
            .transition_status(request.id, request.status, declined_status(actor), None)
            .await?
        else {
            debug!(attempt, "Match request changed concurrently, reloading");
            continue;
        };

        info!(status = %updated.status, "Match request declined");

        notify(
            deps,
            Notification::new(
                counterpart_id(actor, &updated),
                NotificationType::MatchDeclined,
                "Match declined",
                format!(
                    "{} declined the match suggestion.",
                    actor_name(actor, &updated)
                ),
                serde_json::json!({
                    "match_request_id": updated.id,
                    "status": updated.status,
                    "reason": reason,
                }),
            ),
        )
        .await;

        let action = match actor {
            MatchActor::Mentor(_) => AuditAction::MentorDecline,
            MatchActor::Mentee(_) => AuditAction::MenteeDecline,
        };
        record_audit(
            deps,
            MatchAudit::builder()
                .match_request_id(updated.id)
                .actor_id(actor.member_id())
                .actor_role(actor.audit_role())
                .action(action)
                .reason(reason.clone())
                .metadata(serde_json::json!({ "previous_status": request.status }))
                .ip_address(meta.ip_address.clone())
                .build(),
        )
        .await;

        return Ok(updated);
    }

    Err(MatchError::MatchStateConflict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_helpers_are_mirrored() {
        let mentor = MatchActor::Mentor(MemberId::new());
        let mentee = MatchActor::Mentee(MemberId::new());

        assert_eq!(accepted_status(mentor), counterpart_accepted_status(mentee));
        assert_eq!(accepted_status(mentee), counterpart_accepted_status(mentor));
        assert_eq!(declined_status(mentor), MatchStatus::MentorDeclined);
        assert_eq!(declined_status(mentee), MatchStatus::MenteeDeclined);
    }
}
