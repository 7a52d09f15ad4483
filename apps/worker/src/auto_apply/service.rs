//! One auto-apply pass: every eligible profile against one catalog snapshot.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auto_apply::committer::{AppliedJob, ApplicationCommitter, CommitFailure, CommitOutcome};
use crate::auto_apply::quota::{DayBoundary, QuotaTracker};
use crate::auto_apply::scheduler::PassRunner;
use crate::auto_apply::scoring::MatchScorer;
use crate::auto_apply::selector::{CandidateSelector, SelectionSkip};
use crate::errors::{PassError, ProfileError};
use crate::models::{Job, Profile};
use crate::store::{ApplicationLedger, JobCatalog, ProfileStore};

// ────────────────────────────────────────────────────────────────────────────
// Pass reporting
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileStatus {
    Completed,
    Ineligible,
    NoIndustries,
    DailyLimitReached,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub user_id: String,
    pub status: ProfileStatus,
    pub candidates: usize,
    pub recently_applied: Vec<i32>,
    pub committed: Vec<AppliedJob>,
    pub failures: Vec<CommitFailure>,
}

impl ProfileReport {
    fn with_status(user_id: &str, status: ProfileStatus) -> Self {
        Self {
            user_id: user_id.to_string(),
            status,
            candidates: 0,
            recently_applied: Vec::new(),
            committed: Vec::new(),
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub profiles_seen: usize,
    pub profiles_eligible: usize,
    pub profiles_failed: usize,
    pub applications_committed: usize,
    pub commit_failures: usize,
    pub profiles: Vec<ProfileReport>,
}

impl PassSummary {
    pub fn new(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            elapsed_ms: 0,
            profiles_seen: 0,
            profiles_eligible: 0,
            profiles_failed: 0,
            applications_committed: 0,
            commit_failures: 0,
            profiles: Vec::new(),
        }
    }

    fn record(&mut self, report: ProfileReport) {
        if matches!(report.status, ProfileStatus::Failed { .. }) {
            self.profiles_failed += 1;
        }
        self.applications_committed += report.committed.len();
        self.commit_failures += report.failures.len();
        self.profiles.push(report);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

pub struct AutoApplyService {
    profiles: Arc<dyn ProfileStore>,
    catalog: Arc<dyn JobCatalog>,
    selector: CandidateSelector,
    committer: ApplicationCommitter,
}

impl AutoApplyService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        catalog: Arc<dyn JobCatalog>,
        ledger: Arc<dyn ApplicationLedger>,
        scorer: Arc<dyn MatchScorer>,
        boundary: DayBoundary,
    ) -> Self {
        info!("Auto-apply scoring backend: {}", scorer.backend());
        let quota = QuotaTracker::new(Arc::clone(&ledger), boundary);
        Self {
            profiles,
            catalog,
            selector: CandidateSelector::new(scorer, quota),
            committer: ApplicationCommitter::new(ledger),
        }
    }

    /// Runs one pass with `now` as the decision instant for every check.
    ///
    /// The catalog is fetched once and shared by all profiles. Profile-level
    /// failures are recorded and the pass continues; only a failed profile or
    /// catalog listing ends it early.
    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<PassSummary, PassError> {
        let clock = Instant::now();
        let mut summary = PassSummary::new(Uuid::new_v4(), now);
        info!("Auto-apply pass {} started", summary.run_id);

        let profiles = self
            .profiles
            .list_auto_apply_profiles()
            .await
            .map_err(PassError::Profiles)?;
        summary.profiles_seen = profiles.len();

        let (eligible, ineligible): (Vec<Profile>, Vec<Profile>) =
            profiles.into_iter().partition(|p| p.is_eligible(now));
        summary.profiles_eligible = eligible.len();

        for profile in &ineligible {
            debug!(
                "Skipping user {}: subscription {:?} not eligible",
                profile.user_id, profile.status
            );
            summary.record(ProfileReport::with_status(
                &profile.user_id,
                ProfileStatus::Ineligible,
            ));
        }

        if !eligible.is_empty() {
            let catalog = self.catalog.list_jobs().await.map_err(PassError::Catalog)?;
            debug!("Loaded {} catalog jobs for pass {}", catalog.len(), summary.run_id);

            for profile in &eligible {
                let report = match self.process_profile(profile, &catalog, now).await {
                    Ok(report) => report,
                    Err(e) => {
                        error!("Auto-apply failed for user {}: {e}", profile.user_id);
                        ProfileReport::with_status(
                            &profile.user_id,
                            ProfileStatus::Failed {
                                reason: e.to_string(),
                            },
                        )
                    }
                };
                summary.record(report);
            }
        }

        summary.finished_at = Utc::now();
        summary.elapsed_ms = clock.elapsed().as_millis() as u64;
        info!(
            "Auto-apply pass {} completed in {}ms: {} profiles, {} eligible, {} failed, {} applied, {} write failures",
            summary.run_id,
            summary.elapsed_ms,
            summary.profiles_seen,
            summary.profiles_eligible,
            summary.profiles_failed,
            summary.applications_committed,
            summary.commit_failures
        );

        Ok(summary)
    }

    /// Selects and commits for one eligible profile.
    pub async fn process_profile(
        &self,
        profile: &Profile,
        catalog: &[Job],
        now: DateTime<Utc>,
    ) -> Result<ProfileReport, ProfileError> {
        let user_id = profile.user_id.as_str();

        if !profile.has_industries() {
            debug!("User {user_id} has no industries configured, skipping");
            return Ok(ProfileReport::with_status(user_id, ProfileStatus::NoIndustries));
        }

        let resumes = self
            .profiles
            .list_resumes(user_id)
            .await
            .map_err(ProfileError::Resumes)?;

        let selection = self.selector.select(profile, catalog, &resumes, now).await?;
        match selection.skipped {
            Some(SelectionSkip::NoIndustries) => {
                return Ok(ProfileReport::with_status(user_id, ProfileStatus::NoIndustries));
            }
            Some(SelectionSkip::DailyLimitReached) => {
                debug!("User {user_id} has reached daily limit");
                return Ok(ProfileReport::with_status(
                    user_id,
                    ProfileStatus::DailyLimitReached,
                ));
            }
            None => {}
        }

        debug!(
            "User {user_id}: {} remaining today, {} candidates selected",
            selection.remaining_quota,
            selection.candidates.len()
        );

        let mut report = ProfileReport::with_status(user_id, ProfileStatus::Completed);
        report.candidates = selection.candidates.len();
        report.recently_applied = selection.recently_applied.clone();

        let quota = selection.remaining_quota as usize;
        for candidate in &selection.candidates {
            if report.committed.len() >= quota {
                break;
            }
            // Only a successful write spends quota; a failure lets the next candidate in.
            match self.committer.commit(user_id, candidate, now).await {
                CommitOutcome::Committed(application) => {
                    report.committed.push(AppliedJob::from(&application));
                }
                CommitOutcome::Failed(failure) => report.failures.push(failure),
            }
        }

        info!(
            "Applied to {} jobs for user {} ({} candidates, {} failed, {} recently applied)",
            report.committed.len(),
            user_id,
            report.candidates,
            report.failures.len(),
            report.recently_applied.len()
        );

        Ok(report)
    }
}

#[async_trait]
impl PassRunner for AutoApplyService {
    async fn run_pass(&self) -> Result<PassSummary, PassError> {
        self.run_pass_at(Utc::now()).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
