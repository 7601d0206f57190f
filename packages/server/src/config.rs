use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use dotenvy::dotenv;
use std::env;

/// Default suggestion validity window.
pub const DEFAULT_SUGGESTION_TTL_DAYS: i64 = 14;

/// Accepted range for MATCH_SUGGESTION_TTL_DAYS.
pub const SUGGESTION_TTL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=3650;

/// Default number of suggestions generated per mentor per pass.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub matching: MatchingConfig,
    pub notification_queue_capacity: usize,
    /// Cron expression (with seconds) for the nightly suggestion refresh
    pub suggestion_refresh_schedule: String,
}

/// Knobs the matching engine itself reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingConfig {
    /// MATCH_SUGGESTION_TTL_DAYS
    pub suggestion_ttl_days: i64,
    /// MATCH_SUGGESTION_LIMIT
    pub suggestion_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            suggestion_ttl_days: DEFAULT_SUGGESTION_TTL_DAYS,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

impl MatchingConfig {
    /// Read the matching knobs from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            suggestion_ttl_days: validate_ttl_days(parse_var(
                "MATCH_SUGGESTION_TTL_DAYS",
                DEFAULT_SUGGESTION_TTL_DAYS,
            )?)?,
            suggestion_limit: parse_var("MATCH_SUGGESTION_LIMIT", DEFAULT_SUGGESTION_LIMIT)?,
        })
    }

    /// Expiry for a suggestion (re)generated at `now`.
    pub fn suggestion_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        chrono::Duration::try_days(self.suggestion_ttl_days)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .with_context(|| {
                format!(
                    "suggestion TTL of {} days is out of range",
                    self.suggestion_ttl_days
                )
            })
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            matching: MatchingConfig::from_env()?,
            notification_queue_capacity: parse_var("NOTIFICATION_QUEUE_CAPACITY", 1024)?,
            suggestion_refresh_schedule: env::var("SUGGESTION_REFRESH_SCHEDULE")
                .unwrap_or_else(|_| "0 0 3 * * *".to_string()),
        })
    }
}

fn validate_ttl_days(days: i64) -> Result<i64> {
    if !SUGGESTION_TTL_DAYS_RANGE.contains(&days) {
        bail!(
            "MATCH_SUGGESTION_TTL_DAYS must be between {} and {} (got {})",
            SUGGESTION_TTL_DAYS_RANGE.start(),
            SUGGESTION_TTL_DAYS_RANGE.end(),
            days
        );
    }
    Ok(days)
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} must be a valid number (got {:?})", name, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_defaults() {
        let config = MatchingConfig::default();
        assert_eq!(config.suggestion_ttl_days, 14);
        assert_eq!(config.suggestion_limit, 10);

        let now = Utc::now();
        assert_eq!(
            config.suggestion_expiry(now).unwrap(),
            now + chrono::Duration::days(14)
        );
    }

    #[test]
    fn ttl_days_outside_range_are_rejected() {
        for days in [0, -7, 3651, 1_000_000_000] {
            let err = validate_ttl_days(days).unwrap_err();
            assert!(err.to_string().contains("MATCH_SUGGESTION_TTL_DAYS"));
        }
        assert_eq!(validate_ttl_days(1).unwrap(), 1);
        assert_eq!(validate_ttl_days(3650).unwrap(), 3650);
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_panic() {
        let config = MatchingConfig {
            suggestion_ttl_days: 1_000_000_000,
            ..MatchingConfig::default()
        };
        assert!(config.suggestion_expiry(Utc::now()).is_err());

        let config = MatchingConfig {
            suggestion_ttl_days: i64::MAX,
            ..MatchingConfig::default()
        };
        assert!(config.suggestion_expiry(Utc::now()).is_err());
    }

    #[test]
    fn parse_value_trims_whitespace() {
        let days: i64 = parse_value("MATCH_SUGGESTION_TTL_DAYS", " 21 ").unwrap();
        assert_eq!(days, 21);
    }

    #[test]
    fn parse_value_names_the_variable_on_error() {
        let err = parse_value::<usize>("MATCH_SUGGESTION_LIMIT", "ten").unwrap_err();
        assert!(err.to_string().contains("MATCH_SUGGESTION_LIMIT"));
    }
}
