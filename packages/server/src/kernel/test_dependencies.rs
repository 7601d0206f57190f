// TestDependencies - in-memory implementations for testing
//
// Provides an in-memory store and a spy notifier that can be injected into
// ServerDeps for tests. State lives behind one mutex so the mentorship commit
// is a single critical section, like the Postgres transaction.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{BaseAuditLog, BaseMatchStore, BaseNotificationService, BaseProfileStore, ServerDeps};
use crate::common::{MatchRequestId, MemberId};
use crate::config::MatchingConfig;
use crate::domains::matching::models::{
    CapacityGate, EstablishOutcome, EstablishedMentorship, MatchAudit, MatchRequest, MatchStatus,
    Mentorship, Notification, NotificationType, SuggestionUpsert, UpsertOutcome,
};
use crate::domains::member::models::Member;

// =============================================================================
// In-memory store (profiles + matches + audit log)
// =============================================================================

#[derive(Default)]
struct StoreState {
    members: HashMap<MemberId, Member>,
    matches: Vec<MatchRequest>,
    mentorships: Vec<Mentorship>,
    audits: Vec<MatchAudit>,
    /// Statuses forced onto the record right before upcoming conditional
    /// writes, simulating a concurrent request winning the race
    races: Vec<MatchStatus>,
    fail_audits: bool,
    failing_mentors: HashSet<MemberId>,
}

impl StoreState {
    fn match_mut(&mut self, id: MatchRequestId) -> Option<&mut MatchRequest> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    fn apply_race(&mut self, id: MatchRequestId) {
        if self.races.is_empty() {
            return;
        }
        let status = self.races.remove(0);
        if let Some(request) = self.match_mut(id) {
            request.status = status;
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a member profile
    pub fn insert_member(&self, member: Member) {
        self.state.lock().unwrap().members.insert(member.id, member);
    }

    pub fn member(&self, id: MemberId) -> Option<Member> {
        self.state.lock().unwrap().members.get(&id).cloned()
    }

    /// Seed a match request directly (bypassing generation)
    pub fn insert_match(&self, request: MatchRequest) {
        self.state.lock().unwrap().matches.push(request);
    }

    pub fn match_request(&self, id: MatchRequestId) -> Option<MatchRequest> {
        self.state
            .lock()
            .unwrap()
            .matches
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn match_between(&self, mentor_id: MemberId, mentee_id: MemberId) -> Option<MatchRequest> {
        self.state
            .lock()
            .unwrap()
            .matches
            .iter()
            .find(|m| m.mentor_id == mentor_id && m.mentee_id == mentee_id)
            .cloned()
    }

    pub fn matches(&self) -> Vec<MatchRequest> {
        self.state.lock().unwrap().matches.clone()
    }

    /// Mutate a stored request in place (e.g. to backdate `expires_at`)
    pub fn update_match(&self, id: MatchRequestId, f: impl FnOnce(&mut MatchRequest)) {
        if let Some(request) = self.state.lock().unwrap().match_mut(id) {
            f(request);
        }
    }

    pub fn mentorships(&self) -> Vec<Mentorship> {
        self.state.lock().unwrap().mentorships.clone()
    }

    pub fn audits(&self) -> Vec<MatchAudit> {
        self.state.lock().unwrap().audits.clone()
    }

    pub fn audits_for(&self, id: MatchRequestId) -> Vec<MatchAudit> {
        self.state
            .lock()
            .unwrap()
            .audits
            .iter()
            .filter(|a| a.match_request_id == id)
            .cloned()
            .collect()
    }

    /// Make every audit append fail
    pub fn fail_audit_appends(&self, fail: bool) {
        self.state.lock().unwrap().fail_audits = fail;
    }

    /// Make suggestion upserts for this mentor fail
    pub fn fail_upserts_for_mentor(&self, mentor_id: MemberId) {
        self.state.lock().unwrap().failing_mentors.insert(mentor_id);
    }

    /// Before each of the next conditional writes, force the target record
    /// into the given status (one entry per write)
    pub fn race_next_writes(&self, statuses: impl IntoIterator<Item = MatchStatus>) {
        self.state.lock().unwrap().races.extend(statuses);
    }
}

#[async_trait]
impl BaseProfileStore for InMemoryStore {
    async fn find_member(&self, id: MemberId) -> Result<Option<Member>> {
        Ok(self.member(id))
    }

    async fn find_members(&self, ids: &[MemberId]) -> Result<Vec<Member>> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.members.get(id).cloned())
            .collect())
    }

    async fn list_approved_mentors(&self) -> Result<Vec<Member>> {
        let state = self.state.lock().unwrap();
        let mut mentors: Vec<Member> = state
            .members
            .values()
            .filter(|m| m.is_approved_mentor())
            .cloned()
            .collect();
        mentors.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(mentors)
    }

    async fn list_approved_mentees_excluding(
        &self,
        excluded: &[MemberId],
        limit: usize,
    ) -> Result<Vec<Member>> {
        let state = self.state.lock().unwrap();
        let mut mentees: Vec<Member> = state
            .members
            .values()
            .filter(|m| m.is_approved_mentee() && !excluded.contains(&m.id))
            .cloned()
            .collect();
        mentees.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        mentees.truncate(limit);
        Ok(mentees)
    }
}

#[async_trait]
impl BaseMatchStore for InMemoryStore {
    async fn find_match(&self, id: MatchRequestId) -> Result<Option<MatchRequest>> {
        Ok(self.match_request(id))
    }

    async fn find_match_for_mentor(
        &self,
        id: MatchRequestId,
        mentor_id: MemberId,
    ) -> Result<Option<MatchRequest>> {
        Ok(self.match_request(id).filter(|m| m.mentor_id == mentor_id))
    }

    async fn find_match_for_mentee(
        &self,
        id: MatchRequestId,
        mentee_id: MemberId,
    ) -> Result<Option<MatchRequest>> {
        Ok(self.match_request(id).filter(|m| m.mentee_id == mentee_id))
    }

    async fn requested_mentee_ids(&self, mentor_id: MemberId) -> Result<Vec<MemberId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .matches
            .iter()
            .filter(|m| m.mentor_id == mentor_id)
            .map(|m| m.mentee_id)
            .collect())
    }

    async fn mentored_mentee_ids(&self, mentor_id: MemberId) -> Result<Vec<MemberId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .mentorships
            .iter()
            .filter(|m| m.mentor_id == mentor_id)
            .map(|m| m.mentee_id)
            .collect())
    }

    async fn list_open_matches_for_mentor(
        &self,
        mentor_id: MemberId,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchRequest>> {
        let state = self.state.lock().unwrap();
        let mut open: Vec<MatchRequest> = state
            .matches
            .iter()
            .filter(|m| m.mentor_id == mentor_id && m.status.is_open() && !m.is_past_expiry(now))
            .cloned()
            .collect();
        open.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        Ok(open)
    }

    async fn list_matches_for_mentor(
        &self,
        mentor_id: MemberId,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRequest>> {
        let state = self.state.lock().unwrap();
        Ok(sorted_by_score(
            state
                .matches
                .iter()
                .filter(|m| m.mentor_id == mentor_id)
                .filter(|m| status.map_or(true, |s| m.status == s)),
        ))
    }

    async fn list_matches_for_mentee(
        &self,
        mentee_id: MemberId,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRequest>> {
        let state = self.state.lock().unwrap();
        Ok(sorted_by_score(
            state
                .matches
                .iter()
                .filter(|m| m.mentee_id == mentee_id)
                .filter(|m| status.map_or(true, |s| m.status == s)),
        ))
    }

    async fn upsert_suggestion(&self, suggestion: SuggestionUpsert) -> Result<UpsertOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.failing_mentors.contains(&suggestion.mentor_id) {
            return Err(anyhow!("injected upsert failure"));
        }

        let now = Utc::now();
        let existing = state
            .matches
            .iter()
            .position(|m| m.mentor_id == suggestion.mentor_id && m.mentee_id == suggestion.mentee_id);

        match existing {
            Some(index) => {
                let request = &mut state.matches[index];
                request.refresh_from(suggestion, now);
                Ok(UpsertOutcome {
                    request: request.clone(),
                    inserted: false,
                })
            }
            None => {
                let request = MatchRequest::from_suggestion(suggestion, now);
                state.matches.push(request.clone());
                Ok(UpsertOutcome {
                    request,
                    inserted: true,
                })
            }
        }
    }

    async fn transition_status(
        &self,
        id: MatchRequestId,
        expected: MatchStatus,
        next: MatchStatus,
        note: Option<&str>,
    ) -> Result<Option<MatchRequest>> {
        let mut state = self.state.lock().unwrap();
        state.apply_race(id);

        let Some(request) = state.match_mut(id) else {
            return Ok(None);
        };
        if request.status != expected {
            return Ok(None);
        }

        request.status = next;
        if let Some(note) = note {
            request.notes = Some(note.to_string());
        }
        request.updated_at = Utc::now();
        Ok(Some(request.clone()))
    }

    async fn establish_mentorship(
        &self,
        id: MatchRequestId,
        expected: MatchStatus,
        note: Option<&str>,
        gate: CapacityGate,
    ) -> Result<EstablishOutcome> {
        let mut state = self.state.lock().unwrap();
        state.apply_race(id);

        if state.mentorships.iter().any(|m| m.match_request_id == id) {
            return Err(anyhow!("mentorship already exists for match request {}", id));
        }

        let Some(request) = state.match_mut(id) else {
            return Ok(EstablishOutcome::StatusChanged);
        };
        if request.status != expected {
            return Ok(EstablishOutcome::StatusChanged);
        }
        let mentor_id = request.mentor_id;

        if gate == CapacityGate::Enforce {
            if let Some(mentor) = state.members.get(&mentor_id) {
                let capacity = mentor.effective_capacity();
                let active = mentor.effective_active_mentees();
                if active >= capacity {
                    return Ok(EstablishOutcome::MentorAtCapacity { capacity, active });
                }
            }
        }

        let now = Utc::now();
        let Some(request) = state.match_mut(id) else {
            return Ok(EstablishOutcome::StatusChanged);
        };
        request.status = MatchStatus::Connected;
        if let Some(note) = note {
            request.notes = Some(note.to_string());
        }
        request.updated_at = now;
        let request = request.clone();

        let mentorship = Mentorship::for_request(&request, now);
        state.mentorships.push(mentorship.clone());

        if let Some(mentor) = state.members.get_mut(&mentor_id) {
            mentor.active_mentees_count = Some(mentor.effective_active_mentees() + 1);
            mentor.updated_at = now;
        }

        Ok(EstablishOutcome::Established(EstablishedMentorship {
            request,
            mentorship,
        }))
    }

    async fn list_mentorships_for_mentor(&self, mentor_id: MemberId) -> Result<Vec<Mentorship>> {
        let state = self.state.lock().unwrap();
        Ok(newest_first(
            state.mentorships.iter().filter(|m| m.mentor_id == mentor_id),
        ))
    }

    async fn list_mentorships_for_mentee(&self, mentee_id: MemberId) -> Result<Vec<Mentorship>> {
        let state = self.state.lock().unwrap();
        Ok(newest_first(
            state.mentorships.iter().filter(|m| m.mentee_id == mentee_id),
        ))
    }
}

#[async_trait]
impl BaseAuditLog for InMemoryStore {
    async fn append(&self, entry: MatchAudit) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_audits {
            return Err(anyhow!("injected audit failure"));
        }
        state.audits.push(entry);
        Ok(())
    }
}

fn sorted_by_score<'a>(requests: impl Iterator<Item = &'a MatchRequest>) -> Vec<MatchRequest> {
    let mut requests: Vec<MatchRequest> = requests.cloned().collect();
    requests.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.created_at.cmp(&a.created_at))
    });
    requests
}

fn newest_first<'a>(mentorships: impl Iterator<Item = &'a Mentorship>) -> Vec<Mentorship> {
    let mut mentorships: Vec<Mentorship> = mentorships.cloned().collect();
    mentorships.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
    mentorships
}

// =============================================================================
// Spy Notification Service
// =============================================================================

pub struct SpyNotificationService {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: Arc<Mutex<bool>>,
}

impl SpyNotificationService {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Get all notifications that were sent
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Notifications of one type addressed to one member
    pub fn sent_to(&self, user_id: MemberId, kind: NotificationType) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && n.kind == kind)
            .cloned()
            .collect()
    }

    pub fn count_of(&self, kind: NotificationType) -> usize {
        self.sent.lock().unwrap().iter().filter(|n| n.kind == kind).count()
    }

    /// Make every send fail (nothing is recorded while failing)
    pub fn fail_sends(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl Default for SpyNotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseNotificationService for SpyNotificationService {
    async fn send_notification(&self, notification: Notification) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("injected notification failure"));
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub struct TestDependencies {
    pub store: Arc<InMemoryStore>,
    pub notifications: Arc<SpyNotificationService>,
    pub matching: MatchingConfig,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            notifications: Arc::new(SpyNotificationService::new()),
            matching: MatchingConfig::default(),
        }
    }

    /// Override the matching configuration
    pub fn matching_config(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Build ServerDeps backed by the in-memory store and spy notifier
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.notifications.clone(),
            self.matching,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
