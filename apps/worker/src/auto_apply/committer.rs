//! Application Committer: writes one ledger record per accepted candidate.
//!
//! A failed write is returned as a value, never propagated: the caller keeps
//! going with the rest of its candidates. No retry happens within a pass.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::auto_apply::selector::Candidate;
use crate::models::{Application, NewApplication, APPLIED_STATUS};
use crate::store::ApplicationLedger;

/// Slim view of a committed application for pass summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedJob {
    pub application_id: i32,
    pub job_id: i32,
    pub job_title: String,
    pub company: String,
    pub match_score: i32,
    pub resume_used: String,
}

impl From<&Application> for AppliedJob {
    fn from(app: &Application) -> Self {
        Self {
            application_id: app.id,
            job_id: app.job_id,
            job_title: app.job_title.clone(),
            company: app.company.clone(),
            match_score: app.match_score,
            resume_used: app.resume_used.clone(),
        }
    }
}

/// A candidate whose write was refused or failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitFailure {
    pub user_id: String,
    pub job_id: i32,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Committed(Application),
    Failed(CommitFailure),
}

/// Builds the insert payload, snapshotting the job's descriptive fields.
pub fn build_application(
    user_id: &str,
    candidate: &Candidate<'_>,
    now: DateTime<Utc>,
) -> NewApplication {
    let job = candidate.job;
    NewApplication {
        user_id: user_id.to_string(),
        job_id: job.id,
        job_title: job.title.clone(),
        company: job.company.clone(),
        location: job.location.clone(),
        source: job.source.clone(),
        status: APPLIED_STATUS.to_string(),
        resume_used: candidate.resume_used.clone(),
        match_score: candidate.match_score as i32,
        auto_applied: true,
        applied_at: now,
    }
}

pub struct ApplicationCommitter {
    ledger: Arc<dyn ApplicationLedger>,
}

impl ApplicationCommitter {
    pub fn new(ledger: Arc<dyn ApplicationLedger>) -> Self {
        Self { ledger }
    }

    /// Attempts exactly one insert for `candidate`.
    pub async fn commit(
        &self,
        user_id: &str,
        candidate: &Candidate<'_>,
        now: DateTime<Utc>,
    ) -> CommitOutcome {
        let record = build_application(user_id, candidate, now);

        match self.ledger.create_application(record).await {
            Ok(application) => {
                info!(
                    "Applied for {} at {} for user {} (score {}, resume {})",
                    application.job_title,
                    application.company,
                    user_id,
                    application.match_score,
                    application.resume_used
                );
                CommitOutcome::Committed(application)
            }
            Err(e) => {
                warn!(
                    "Failed to apply for job {} for user {}: {e}",
                    candidate.job.id, user_id
                );
                CommitOutcome::Failed(CommitFailure {
                    user_id: user_id.to_string(),
                    job_id: candidate.job.id,
                    reason: e.to_string(),
                })
            }
        }
    }
}
