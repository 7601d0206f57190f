use tracing::{info, instrument};

use crate::domains::matching::activities::side_effects::{notify, record_audit};
use crate::domains::matching::errors::MatchError;
use crate::domains::matching::models::{
    AuditAction, CapacityGate, EstablishOutcome, EstablishedMentorship, MatchActor, MatchAudit,
    MatchRequest, MatchStatus, Notification, NotificationType, RequestMeta,
};
use crate::kernel::ServerDeps;

/// Commit a mutual acceptance.
///
/// The store connects the request (only if it is still in `expected`), creates
/// the mentorship and bumps the mentor's active count as one unit. Both parties
/// then get a MATCH_CONFIRMED notification and one `connected` audit entry is
/// written. Returns `None` when the request moved away from `expected` first;
/// nothing is written in that case.
///
/// When the mentor is the deciding party the capacity check is repeated
/// inside the commit and a full mentor fails with `MentorCapacityReached`.
#[instrument(skip(request, deps, meta), fields(match_request_id = %request.id, expected = %expected))]
pub async fn establish_mentorship(
    request: &MatchRequest,
    expected: MatchStatus,
    actor: MatchActor,
    note: Option<&str>,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Option<EstablishedMentorship>, MatchError> {
    let gate = match actor {
        MatchActor::Mentor(_) => CapacityGate::Enforce,
        MatchActor::Mentee(_) => CapacityGate::Skip,
    };

    let established = match deps
        .matches
        .establish_mentorship(request.id, expected, note, gate)
        .await?
    {
        EstablishOutcome::Established(established) => established,
        EstablishOutcome::StatusChanged => return Ok(None),
        EstablishOutcome::MentorAtCapacity { capacity, active } => {
            info!(mentor_id = %request.mentor_id, capacity, active, "Mentor filled up before commit");
            return Err(MatchError::MentorCapacityReached { capacity, active });
        }
    };

    let connected = &established.request;
    let mentorship = &established.mentorship;

    info!(
        mentorship_id = %mentorship.id,
        mentor_id = %connected.mentor_id,
        mentee_id = %connected.mentee_id,
        "Mentorship established"
    );

    let data = serde_json::json!({
        "match_request_id": connected.id,
        "mentorship_id": mentorship.id,
        "mentor_id": connected.mentor_id,
        "mentee_id": connected.mentee_id,
    });

    notify(
        deps,
        Notification::new(
            connected.mentor_id,
            NotificationType::MatchConfirmed,
            "Mentorship confirmed",
            format!(
                "You are now mentoring {}.",
                connected.mentee_snapshot.full_name
            ),
            data.clone(),
        ),
    )
    .await;

    notify(
        deps,
        Notification::new(
            connected.mentee_id,
            NotificationType::MatchConfirmed,
            "Mentorship confirmed",
            format!(
                "{} is now your mentor.",
                connected.mentor_snapshot.full_name
            ),
            data,
        ),
    )
    .await;

    record_audit(
        deps,
        MatchAudit::builder()
            .match_request_id(connected.id)
            .actor_id(actor.member_id())
            .actor_role(actor.audit_role())
            .action(AuditAction::Connected)
            .metadata(serde_json::json!({
                "mentorship_id": mentorship.id,
                "previous_status": expected,
            }))
            .ip_address(meta.ip_address.clone())
            .build(),
    )
    .await;

    Ok(Some(established))
}
