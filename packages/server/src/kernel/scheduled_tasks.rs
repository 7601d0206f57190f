//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (nightly by default)
//!     │
//!     └─► generate_suggestions_for_all_mentors()
//!             └─► per mentor: new suggestions + refreshed TTLs
//! ```
//!
//! Expiry is never swept here; requests expire lazily when actioned.

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::matching::activities::generate_suggestions_for_all_mentors;
use crate::kernel::ServerDeps;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: ServerDeps, refresh_schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let refresh_job = Job::new_async(refresh_schedule, move |_uuid, _lock| {
        let deps = deps.clone();
        Box::pin(async move {
            if let Err(e) = run_suggestion_refresh(&deps).await {
                tracing::error!("Suggestion refresh task failed: {}", e);
            }
        })
    })?;

    scheduler.add(refresh_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule = %refresh_schedule, "Scheduled tasks started (suggestion refresh)");
    Ok(scheduler)
}

/// Regenerate suggestions for every approved mentor
async fn run_suggestion_refresh(deps: &ServerDeps) -> Result<()> {
    tracing::info!("Running scheduled suggestion refresh");

    let summary = generate_suggestions_for_all_mentors(None, deps).await?;

    tracing::info!(
        "Suggestion refresh complete: {} mentors, {} created, {} refreshed, {} failed",
        summary.mentors,
        summary.created,
        summary.refreshed,
        summary.failed
    );

    Ok(())
}
