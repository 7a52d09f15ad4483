use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog entry as read from `jobs`. Read-only for the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub location: String,
    pub industry: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}
