//! CLI for running suggestion generation by hand
//!
//! Prints JSON summaries to stdout so it can be scripted.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mentorship_core::common::MemberId;
use mentorship_core::domains::matching::activities::{
    generate_suggestions_for_all_mentors, generate_suggestions_for_mentor, SuggestionBatch,
};
use mentorship_core::domains::matching::MatchError;
use mentorship_core::kernel::{NotificationDispatcher, PgNotificationSink, ServerDeps};
use mentorship_core::Config;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "matching_cli")]
#[command(about = "Mentor/mentee suggestion generation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate suggestions for one mentor
    Generate {
        #[arg(long)]
        mentor: MemberId,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Generate suggestions for every approved mentor
    GenerateAll {
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    code: &'static str,
    message: String,
}

/// JSON for a single-mentor run, plus whether it failed.
fn render_generate(result: Result<SuggestionBatch, MatchError>) -> Result<(String, bool)> {
    match result {
        Ok(batch) => Ok((serde_json::to_string_pretty(&batch)?, false)),
        Err(e) => {
            let body = ErrorResponse {
                success: false,
                code: e.code(),
                message: e.to_string(),
            };
            Ok((serde_json::to_string_pretty(&body)?, true))
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,mentorship_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let (dispatcher, dispatcher_handle) = NotificationDispatcher::spawn(
        Arc::new(PgNotificationSink::new(pool.clone())),
        config.notification_queue_capacity,
    );
    let deps = ServerDeps::postgres(pool, Arc::new(dispatcher), config.matching);

    let (output, failed) = match cli.command {
        Commands::Generate { mentor, limit } => {
            render_generate(generate_suggestions_for_mentor(mentor, limit, &deps).await)?
        }
        Commands::GenerateAll { limit } => {
            let summary = generate_suggestions_for_all_mentors(limit, &deps).await?;
            (serde_json::to_string_pretty(&summary)?, false)
        }
    };

    // Flush queued notifications before exiting
    drop(deps);
    dispatcher_handle
        .await
        .context("Notification dispatcher failed")?;

    println!("{}", output);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_generate_is_reported_as_failure() {
        let (json, failed) = render_generate(Err(MatchError::MentorNotAvailable)).unwrap();
        assert!(failed);
        assert!(json.contains("MENTOR_NOT_AVAILABLE"));
        assert!(json.contains("\"success\": false"));
    }

    #[test]
    fn successful_generate_is_not_a_failure() {
        let batch = SuggestionBatch {
            mentor_id: MemberId::new(),
            created: 0,
            refreshed: 0,
            suggestions: Vec::new(),
        };
        let (json, failed) = render_generate(Ok(batch)).unwrap();
        assert!(!failed);
        assert!(json.contains("\"created\": 0"));
    }
}
