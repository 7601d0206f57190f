//! Suggestion generation.
//!
//! ```text
//! mentor ─► exclusions (requests ∪ mentorships)
//!        ─► oversampled mentee pool ─► score ─► top N ─► upsert (+ audit)
//!        ─► refresh still-open requests (score, snapshots, TTL)
//!        ─► one MATCH_SUGGESTION notification if anything new
//! ```

use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, instrument};

use crate::common::MemberId;
use crate::domains::matching::activities::side_effects::{notify, record_audit};
use crate::domains::matching::errors::MatchError;
use crate::domains::matching::models::{
    AuditAction, AuditActorRole, MatchAudit, MatchRequest, MenteeSnapshot, MentorSnapshot,
    Notification, NotificationType, SuggestionUpsert,
};
use crate::domains::matching::utils::calculate_score;
use crate::domains::member::models::Member;
use crate::kernel::ServerDeps;

/// Upper bound on suggestions per mentor per pass.
pub const MAX_SUGGESTION_LIMIT: usize = 50;

/// Minimum size of the candidate pool fetched before scoring.
const MIN_CANDIDATE_POOL: usize = 30;

/// Outcome of one generation pass for one mentor.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionBatch {
    pub mentor_id: MemberId,
    /// New requests inserted this pass
    pub created: usize,
    /// Existing requests whose score, snapshots and expiry were refreshed
    pub refreshed: usize,
    /// Every request touched this pass, best score first
    pub suggestions: Vec<MatchRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MentorRunOutcome {
    Generated { created: usize, refreshed: usize },
    Failed { code: String, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct MentorRunSummary {
    pub mentor_id: MemberId,
    #[serde(flatten)]
    pub outcome: MentorRunOutcome,
}

/// Summary of a pass over every approved mentor.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationSummary {
    pub mentors: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub created: usize,
    pub refreshed: usize,
    pub results: Vec<MentorRunSummary>,
}

/// Clamp a requested limit into `1..=50`, defaulting to the configured limit.
pub fn resolve_limit(requested: Option<usize>, configured: usize) -> usize {
    requested
        .unwrap_or(configured)
        .clamp(1, MAX_SUGGESTION_LIMIT)
}

/// Candidates fetched before scoring: three times the limit, at least 30.
pub fn candidate_pool_size(limit: usize) -> usize {
    limit.saturating_mul(3).max(MIN_CANDIDATE_POOL)
}

/// Generate (and refresh) suggestions for one mentor.
#[instrument(skip(deps), fields(mentor_id = %mentor_id))]
pub async fn generate_suggestions_for_mentor(
    mentor_id: MemberId,
    limit: Option<usize>,
    deps: &ServerDeps,
) -> Result<SuggestionBatch, MatchError> {
    let mentor = deps
        .profiles
        .find_member(mentor_id)
        .await?
        .filter(Member::is_approved_mentor)
        .ok_or(MatchError::MentorNotAvailable)?;

    let limit = resolve_limit(limit, deps.matching.suggestion_limit);
    let now = Utc::now();
    let expires_at = deps.matching.suggestion_expiry(now)?;

    // Open requests are captured before this pass inserts anything, so the
    // refresh below only touches pre-existing rows
    let open_requests = deps.matches.list_open_matches_for_mentor(mentor_id, now).await?;

    let mut excluded: HashSet<MemberId> = deps
        .matches
        .requested_mentee_ids(mentor_id)
        .await?
        .into_iter()
        .collect();
    excluded.extend(deps.matches.mentored_mentee_ids(mentor_id).await?);
    let excluded: Vec<MemberId> = excluded.into_iter().collect();

    let pool_size = candidate_pool_size(limit);
    let candidates = deps
        .profiles
        .list_approved_mentees_excluding(&excluded, pool_size)
        .await?;

    debug!(
        excluded = excluded.len(),
        candidates = candidates.len(),
        pool_size,
        limit,
        "Scoring mentee candidates"
    );

    let mut scored: Vec<(i32, &Member, _)> = candidates
        .iter()
        .map(|mentee| {
            let result = calculate_score(&mentor, mentee);
            (result.score, mentee, result.breakdown)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
    scored.truncate(limit);

    let mentor_snapshot = MentorSnapshot::from(&mentor);
    let mut created = Vec::new();
    let mut refreshed = 0;
    let mut touched = Vec::new();

    for (score, mentee, breakdown) in scored {
        let outcome = deps
            .matches
            .upsert_suggestion(SuggestionUpsert {
                mentor_id,
                mentee_id: mentee.id,
                score,
                breakdown,
                mentor_snapshot: mentor_snapshot.clone(),
                mentee_snapshot: MenteeSnapshot::from(mentee),
                expires_at,
            })
            .await?;

        debug!(
            mentee_id = %mentee.id,
            score,
            inserted = outcome.inserted,
            "Upserted suggestion"
        );

        if outcome.inserted {
            record_audit(
                deps,
                MatchAudit::builder()
                    .match_request_id(outcome.request.id)
                    .actor_role(AuditActorRole::System)
                    .action(AuditAction::Suggested)
                    .metadata(serde_json::json!({ "score": score }))
                    .build(),
            )
            .await;
            created.push(outcome.request.id);
        } else {
            refreshed += 1;
        }
        touched.push(outcome.request);
    }

    refreshed += refresh_open_requests(
        &mentor,
        &mentor_snapshot,
        open_requests,
        expires_at,
        deps,
        &mut touched,
    )
    .await?;

    if !created.is_empty() {
        let count = created.len();
        notify(
            deps,
            Notification::new(
                mentor_id,
                NotificationType::MatchSuggestion,
                "New mentee suggestions",
                format!(
                    "You have {} new mentee suggestion{} to review",
                    count,
                    if count == 1 { "" } else { "s" }
                ),
                serde_json::json!({
                    "mentor_id": mentor_id,
                    "count": count,
                    "match_request_ids": created,
                }),
            ),
        )
        .await;
    }

    touched.sort_by(|a, b| b.score.cmp(&a.score).then(a.mentee_id.cmp(&b.mentee_id)));

    info!(created = created.len(), refreshed, "Suggestion pass complete");

    Ok(SuggestionBatch {
        mentor_id,
        created: created.len(),
        refreshed,
        suggestions: touched,
    })
}

/// Re-score open requests and push their expiry out. Status is never touched.
/// Mentees who are gone or no longer approved are skipped and left to lapse.
async fn refresh_open_requests(
    mentor: &Member,
    mentor_snapshot: &MentorSnapshot,
    open_requests: Vec<MatchRequest>,
    expires_at: chrono::DateTime<Utc>,
    deps: &ServerDeps,
    touched: &mut Vec<MatchRequest>,
) -> Result<usize, MatchError> {
    if open_requests.is_empty() {
        return Ok(0);
    }

    let mentee_ids: Vec<MemberId> = open_requests.iter().map(|r| r.mentee_id).collect();
    let mentees: HashMap<MemberId, Member> = deps
        .profiles
        .find_members(&mentee_ids)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut refreshed = 0;
    for request in open_requests {
        let Some(mentee) = mentees.get(&request.mentee_id).filter(|m| m.is_approved_mentee()) else {
            debug!(mentee_id = %request.mentee_id, "Skipping refresh for unavailable mentee");
            continue;
        };

        let result = calculate_score(mentor, mentee);
        let outcome = deps
            .matches
            .upsert_suggestion(SuggestionUpsert {
                mentor_id: mentor.id,
                mentee_id: mentee.id,
                score: result.score,
                breakdown: result.breakdown,
                mentor_snapshot: mentor_snapshot.clone(),
                mentee_snapshot: MenteeSnapshot::from(mentee),
                expires_at,
            })
            .await?;

        debug!(
            match_request_id = %outcome.request.id,
            status = %outcome.request.status,
            score = result.score,
            "Refreshed open suggestion"
        );

        refreshed += 1;
        touched.push(outcome.request);
    }

    Ok(refreshed)
}

/// Run a generation pass for every approved mentor, one at a time.
///
/// A failing mentor is logged and recorded in the summary; the pass moves on.
#[instrument(skip(deps))]
pub async fn generate_suggestions_for_all_mentors(
    limit: Option<usize>,
    deps: &ServerDeps,
) -> Result<GenerationSummary, MatchError> {
    let mentors = deps.profiles.list_approved_mentors().await?;
    info!(mentors = mentors.len(), "Generating suggestions for all mentors");

    let mut summary = GenerationSummary {
        mentors: mentors.len(),
        ..Default::default()
    };

    for mentor in mentors {
        match generate_suggestions_for_mentor(mentor.id, limit, deps).await {
            Ok(batch) => {
                summary.succeeded += 1;
                summary.created += batch.created;
                summary.refreshed += batch.refreshed;
                summary.results.push(MentorRunSummary {
                    mentor_id: mentor.id,
                    outcome: MentorRunOutcome::Generated {
                        created: batch.created,
                        refreshed: batch.refreshed,
                    },
                });
            }
            Err(e) => {
                error!(mentor_id = %mentor.id, code = e.code(), error = %e, "Suggestion pass failed for mentor");
                summary.failed += 1;
                summary.results.push(MentorRunSummary {
                    mentor_id: mentor.id,
                    outcome: MentorRunOutcome::Failed {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    },
                });
            }
        }
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        created = summary.created,
        refreshed = summary.refreshed,
        "Suggestion generation finished"
    );

    Ok(summary)
}
