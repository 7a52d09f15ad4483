//! Candidate Selector: turns a profile plus the shared catalog snapshot into
//! the ordered list of jobs to apply to this pass.
//!
//! Selection performs no writes. Dedup is a fresh ledger lookup per candidate.
//! The list is not cut at the remaining quota: a candidate whose write fails
//! frees its slot for the next one, so the committer stops once the quota is
//! spent on successful writes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auto_apply::quota::QuotaTracker;
use crate::auto_apply::scoring::{rank_jobs, MatchScorer};
use crate::errors::ProfileError;
use crate::models::{Job, Profile, Resume, DEFAULT_RESUME_TAG};

/// A job accepted for this profile, with the resume tag to record.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub job: &'a Job,
    pub match_score: u32,
    pub resume_used: String,
}

/// Why a selection came back empty without looking at the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSkip {
    NoIndustries,
    DailyLimitReached,
}

#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub candidates: Vec<Candidate<'a>>,
    /// Quota available before any of `candidates` is committed. Commits stop here.
    pub remaining_quota: u32,
    /// Jobs that cleared the threshold but were applied to inside the dedup window.
    pub recently_applied: Vec<i32>,
    pub skipped: Option<SelectionSkip>,
}

impl<'a> Selection<'a> {
    fn skipped(reason: SelectionSkip, remaining_quota: u32) -> Self {
        Self {
            candidates: Vec::new(),
            remaining_quota,
            recently_applied: Vec::new(),
            skipped: Some(reason),
        }
    }
}

pub struct CandidateSelector {
    scorer: Arc<dyn MatchScorer>,
    quota: QuotaTracker,
}

impl CandidateSelector {
    pub fn new(scorer: Arc<dyn MatchScorer>, quota: QuotaTracker) -> Self {
        Self { scorer, quota }
    }

    /// Selects candidates for `profile`.
    ///
    /// Algorithm:
    /// 1. No industries configured → empty
    /// 2. Remaining daily quota of zero → empty
    /// 3. Score the catalog, keep scores ≥ threshold, sort descending (stable)
    /// 4. Walk the ranking, skipping jobs inside the dedup window
    /// 5. Resolve the resume tag for each accepted job
    ///
    /// Candidates come back in commit order; the caller consumes at most
    /// `remaining_quota` successful writes from the front.
    pub async fn select<'a>(
        &self,
        profile: &Profile,
        catalog: &'a [Job],
        resumes: &[Resume],
        now: DateTime<Utc>,
    ) -> Result<Selection<'a>, ProfileError> {
        if !profile.has_industries() {
            return Ok(Selection::skipped(SelectionSkip::NoIndustries, 0));
        }

        let remaining_quota = self
            .quota
            .remaining_today(profile, now)
            .await
            .map_err(ProfileError::Quota)?;
        if remaining_quota == 0 {
            return Ok(Selection::skipped(SelectionSkip::DailyLimitReached, 0));
        }

        let ranked = rank_jobs(self.scorer.as_ref(), profile, catalog);

        let mut candidates = Vec::new();
        let mut recently_applied = Vec::new();

        for scored in ranked {
            let allowed = self
                .quota
                .can_apply(&profile.user_id, scored.job.id, now)
                .await
                .map_err(ProfileError::Dedup)?;
            if !allowed {
                recently_applied.push(scored.job.id);
                continue;
            }

            candidates.push(Candidate {
                job: scored.job,
                match_score: scored.match_score,
                resume_used: resolve_resume(resumes, scored.job),
            });
        }

        Ok(Selection {
            candidates,
            remaining_quota,
            recently_applied,
            skipped: None,
        })
    }
}

/// The industry tag of the user's resume for the job's industry, else "Default".
pub fn resolve_resume(resumes: &[Resume], job: &Job) -> String {
    job.industry
        .as_deref()
        .and_then(|industry| resumes.iter().find(|r| r.industry == industry))
        .map(|r| r.industry.clone())
        .unwrap_or_else(|| DEFAULT_RESUME_TAG.to_string())
}
