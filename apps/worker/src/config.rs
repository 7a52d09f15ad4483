use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::auto_apply::quota::DayBoundary;
use crate::auto_apply::scheduler::{ScheduleConfig, DEFAULT_INTERVAL, DEFAULT_STARTUP_DELAY};

/// Worker configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    pub schedule: ScheduleConfig,
    pub day_boundary: DayBoundary,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("Required environment variable 'DATABASE_URL' is not set")?;

        let schedule = ScheduleConfig {
            interval: parse_secs(&lookup, "AUTO_APPLY_INTERVAL_SECS", DEFAULT_INTERVAL)?,
            startup_delay: parse_secs(
                &lookup,
                "AUTO_APPLY_STARTUP_DELAY_SECS",
                DEFAULT_STARTUP_DELAY,
            )?,
        };

        let day_boundary = match lookup("AUTO_APPLY_DAY_BOUNDARY") {
            Some(raw) => raw
                .parse::<DayBoundary>()
                .map_err(anyhow::Error::msg)
                .context("AUTO_APPLY_DAY_BOUNDARY must be 'local' or 'utc'")?,
            None => DayBoundary::Local,
        };

        Ok(Config {
            database_url,
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            schedule,
            day_boundary,
        })
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let secs = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{key} must be a whole number of seconds"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
