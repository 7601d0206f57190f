//! Server dependencies for matching activities (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! matching activity. All storage and delivery goes through trait objects so
//! tests can swap in the in-memory implementations.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::MatchingConfig;
use crate::kernel::postgres::{PgAuditLog, PgMatchStore, PgProfileStore};
use crate::kernel::{BaseAuditLog, BaseMatchStore, BaseNotificationService, BaseProfileStore};

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub profiles: Arc<dyn BaseProfileStore>,
    pub matches: Arc<dyn BaseMatchStore>,
    pub audit_log: Arc<dyn BaseAuditLog>,
    /// Usually a `NotificationDispatcher`; sends are fire-and-forget
    pub notifications: Arc<dyn BaseNotificationService>,
    pub matching: MatchingConfig,
}

impl ServerDeps {
    pub fn new(
        profiles: Arc<dyn BaseProfileStore>,
        matches: Arc<dyn BaseMatchStore>,
        audit_log: Arc<dyn BaseAuditLog>,
        notifications: Arc<dyn BaseNotificationService>,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            profiles,
            matches,
            audit_log,
            notifications,
            matching,
        }
    }

    /// Wire the Postgres adapters around one pool
    pub fn postgres(
        pool: PgPool,
        notifications: Arc<dyn BaseNotificationService>,
        matching: MatchingConfig,
    ) -> Self {
        Self::new(
            Arc::new(PgProfileStore::new(pool.clone())),
            Arc::new(PgMatchStore::new(pool.clone())),
            Arc::new(PgAuditLog::new(pool)),
            notifications,
            matching,
        )
    }
}
