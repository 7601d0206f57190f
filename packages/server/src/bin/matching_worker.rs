// Background worker for the matching engine
//
// Owns the notification dispatcher and the nightly suggestion refresh.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mentorship_core::kernel::{
    scheduled_tasks::start_scheduler, NotificationDispatcher, PgNotificationSink, ServerDeps,
};
use mentorship_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DISPATCHER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mentorship_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting matching worker");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let (dispatcher, dispatcher_handle) = NotificationDispatcher::spawn(
        Arc::new(PgNotificationSink::new(pool.clone())),
        config.notification_queue_capacity,
    );

    let deps = ServerDeps::postgres(pool, Arc::new(dispatcher), config.matching);

    let mut scheduler = start_scheduler(deps.clone(), &config.suggestion_refresh_schedule)
        .await
        .context("Failed to start scheduler")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    scheduler
        .shutdown()
        .await
        .context("Failed to stop scheduler")?;

    // Dropping the last dispatcher handle lets the consumer drain and exit
    drop(scheduler);
    drop(deps);
    match tokio::time::timeout(DISPATCHER_DRAIN_TIMEOUT, dispatcher_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Notification dispatcher ended abnormally: {}", e),
        Err(_) => tracing::warn!("Notification dispatcher did not drain before shutdown"),
    }

    tracing::info!("Matching worker stopped");
    Ok(())
}
