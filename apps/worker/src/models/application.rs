use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status every auto-applied record is created with.
pub const APPLIED_STATUS: &str = "applied";

/// Ledger row in `applications`. Append-only from the worker's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i32,
    pub user_id: String,
    pub job_id: i32,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub source: Option<String>,
    pub status: String,
    pub resume_used: String,
    pub match_score: i32,
    pub auto_applied: bool,
    pub applied_at: DateTime<Utc>,
}

/// Insert payload. Job fields are a snapshot taken at apply time so the record
/// survives later edits or deletion of the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub user_id: String,
    pub job_id: i32,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub source: Option<String>,
    pub status: String,
    pub resume_used: String,
    pub match_score: i32,
    pub auto_applied: bool,
    pub applied_at: DateTime<Utc>,
}
