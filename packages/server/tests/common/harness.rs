//! Test harness backed by the in-memory store and spy notifier.
//!
//! Every test gets a fresh store; nothing is shared between tests.

use chrono::{Duration, Utc};
use mentorship_core::domains::matching::models::{
    MatchRequest, MatchStatus, MenteeSnapshot, MentorSnapshot, SuggestionUpsert,
};
use mentorship_core::domains::matching::utils::calculate_score;
use mentorship_core::domains::member::models::Member;
use mentorship_core::kernel::{
    InMemoryStore, ServerDeps, SpyNotificationService, TestDependencies,
};
use test_context::AsyncTestContext;

/// Test harness that wires activities to in-memory infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(MatchingHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &MatchingHarness) {
///     let mentor = ctx.add(approved_mentor("Ada"));
///     // ... test code
/// }
/// ```
pub struct MatchingHarness {
    pub test_deps: TestDependencies,
    pub deps: ServerDeps,
}

impl AsyncTestContext for MatchingHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {}
}

impl MatchingHarness {
    pub fn new() -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let test_deps = TestDependencies::new();
        let deps = test_deps.server_deps();
        Self { test_deps, deps }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.test_deps.store
    }

    pub fn notifications(&self) -> &SpyNotificationService {
        &self.test_deps.notifications
    }

    /// Insert a member profile and hand it back
    pub fn add(&self, member: Member) -> Member {
        self.store().insert_member(member.clone());
        member
    }

    /// Current stored copy of a member
    pub fn reload(&self, member: &Member) -> Member {
        self.store()
            .member(member.id)
            .expect("member should exist in the store")
    }

    /// Seed a scored request in `status`, expiring after the default TTL
    pub fn seed_match(&self, mentor: &Member, mentee: &Member, status: MatchStatus) -> MatchRequest {
        let result = calculate_score(mentor, mentee);
        let mut request = MatchRequest::from_suggestion(
            SuggestionUpsert {
                mentor_id: mentor.id,
                mentee_id: mentee.id,
                score: result.score,
                breakdown: result.breakdown,
                mentor_snapshot: MentorSnapshot::from(mentor),
                mentee_snapshot: MenteeSnapshot::from(mentee),
                expires_at: self
                    .deps
                    .matching
                    .suggestion_expiry(Utc::now())
                    .expect("default TTL fits"),
            },
            Utc::now(),
        );
        request.status = status;
        self.store().insert_match(request.clone());
        request
    }

    /// Push a stored request's expiry into the past
    pub fn expire(&self, request: &MatchRequest) {
        self.store().update_match(request.id, |r| {
            r.expires_at = Utc::now() - Duration::minutes(1);
        });
    }

    pub fn status_of(&self, request: &MatchRequest) -> MatchStatus {
        self.store()
            .match_request(request.id)
            .expect("match request should exist in the store")
            .status
    }
}
