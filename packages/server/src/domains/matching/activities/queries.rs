//! Read side of the matching engine.

use tracing::instrument;

use crate::common::{MatchRequestId, MemberId};
use crate::domains::matching::errors::MatchError;
use crate::domains::matching::models::{MatchActor, MatchRequest, MatchStatus, Mentorship};
use crate::kernel::ServerDeps;

/// Suggestions for a mentor, best score first.
#[instrument(skip(deps), fields(mentor_id = %mentor_id))]
pub async fn list_suggestions_for_mentor(
    mentor_id: MemberId,
    status: Option<MatchStatus>,
    deps: &ServerDeps,
) -> Result<Vec<MatchRequest>, MatchError> {
    Ok(deps.matches.list_matches_for_mentor(mentor_id, status).await?)
}

/// Suggestions for a mentee, best score first.
#[instrument(skip(deps), fields(mentee_id = %mentee_id))]
pub async fn list_suggestions_for_mentee(
    mentee_id: MemberId,
    status: Option<MatchStatus>,
    deps: &ServerDeps,
) -> Result<Vec<MatchRequest>, MatchError> {
    Ok(deps.matches.list_matches_for_mentee(mentee_id, status).await?)
}

/// Load a request only if it belongs to `actor`.
///
/// Someone else's request is indistinguishable from a missing one.
#[instrument(skip(deps), fields(match_request_id = %match_id))]
pub async fn get_match_for_actor(
    match_id: MatchRequestId,
    actor: MatchActor,
    deps: &ServerDeps,
) -> Result<MatchRequest, MatchError> {
    let found = match actor {
        MatchActor::Mentor(mentor_id) => deps.matches.find_match_for_mentor(match_id, mentor_id).await?,
        MatchActor::Mentee(mentee_id) => deps.matches.find_match_for_mentee(match_id, mentee_id).await?,
    };

    found.ok_or(MatchError::MatchNotFound)
}

/// Confirmed mentorships of a mentor, newest first.
#[instrument(skip(deps), fields(mentor_id = %mentor_id))]
pub async fn list_mentorships_for_mentor(
    mentor_id: MemberId,
    deps: &ServerDeps,
) -> Result<Vec<Mentorship>, MatchError> {
    Ok(deps.matches.list_mentorships_for_mentor(mentor_id).await?)
}

/// Confirmed mentorships of a mentee, newest first.
#[instrument(skip(deps), fields(mentee_id = %mentee_id))]
pub async fn list_mentorships_for_mentee(
    mentee_id: MemberId,
    deps: &ServerDeps,
) -> Result<Vec<Mentorship>, MatchError> {
    Ok(deps.matches.list_mentorships_for_mentee(mentee_id).await?)
}
