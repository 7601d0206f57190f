//! Kernel module - infrastructure traits, adapters and dependencies.

pub mod deps;
pub mod notification_dispatcher;
pub mod postgres;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use notification_dispatcher::NotificationDispatcher;
pub use postgres::{PgAuditLog, PgMatchStore, PgNotificationSink, PgProfileStore};
pub use test_dependencies::{InMemoryStore, SpyNotificationService, TestDependencies};
pub use traits::*;
