//! Match Scoring: pluggable scorer that rates a (profile, job) pairing.
//!
//! Default: `RuleMatchScorer` (pure, deterministic, no I/O).
//! The service holds an `Arc<dyn MatchScorer>`; the candidate threshold is
//! fixed at `MATCH_THRESHOLD` whatever backend is plugged in.

use serde::Serialize;

use crate::models::{Job, Profile};

/// Minimum score for a job to become a candidate.
pub const MATCH_THRESHOLD: u32 = 70;

const BASE_SCORE: u32 = 50;
const INDUSTRY_BONUS: u32 = 30;
const LOCATION_BONUS: u32 = 20;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// A catalog job paired with its score for one profile. Lives for one selection pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredJob<'a> {
    pub job: &'a Job,
    pub match_score: u32, // 0 – 100
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching selection code.
pub trait MatchScorer: Send + Sync {
    /// Score in `[0, 100]`. Must be deterministic for identical inputs.
    fn score(&self, profile: &Profile, job: &Job) -> u32;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleMatchScorer: default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Rule-based scorer.
///
/// Algorithm:
/// 1. Start at 50
/// 2. +30 when the job's industry is one of the profile's industries (exact, case-sensitive)
/// 3. +20 when the job location contains the first comma-delimited segment of the
///    profile location (case-insensitive)
///
/// Attainable totals: 50, 70, 80, 100.
pub struct RuleMatchScorer;

impl MatchScorer for RuleMatchScorer {
    fn score(&self, profile: &Profile, job: &Job) -> u32 {
        compute_match_score(profile, job)
    }

    fn backend(&self) -> &'static str {
        "rules"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core rule algorithm
// ────────────────────────────────────────────────────────────────────────────

pub fn compute_match_score(profile: &Profile, job: &Job) -> u32 {
    let mut score = BASE_SCORE;

    if industry_matches(profile, job) {
        score += INDUSTRY_BONUS;
    }
    if location_matches(profile, job) {
        score += LOCATION_BONUS;
    }

    score.min(100)
}

fn industry_matches(profile: &Profile, job: &Job) -> bool {
    match job.industry.as_deref() {
        Some(industry) if !industry.is_empty() => {
            profile.industries.iter().any(|i| i == industry)
        }
        _ => false,
    }
}

fn location_matches(profile: &Profile, job: &Job) -> bool {
    match location_token(profile.location.as_deref()) {
        Some(token) => job.location.to_lowercase().contains(&token),
        None => false,
    }
}

/// Lowercased first comma-delimited segment of a non-empty profile location:
/// "Sydney, NSW" → "sydney". The segment is used as-is, so a location that
/// starts with a comma yields an empty token that every job location contains.
fn location_token(location: Option<&str>) -> Option<String> {
    let location = location.filter(|l| !l.is_empty())?;
    let first = location.split(',').next().unwrap_or_default();
    Some(first.to_lowercase())
}

/// Scores every job, keeps those at or above `MATCH_THRESHOLD`, and sorts them
/// by score descending. The sort is stable, so equal scores keep catalog order.
pub fn rank_jobs<'a>(
    scorer: &dyn MatchScorer,
    profile: &Profile,
    catalog: &'a [Job],
) -> Vec<ScoredJob<'a>> {
    let mut ranked: Vec<ScoredJob<'a>> = catalog
        .iter()
        .map(|job| ScoredJob {
            job,
            match_score: scorer.score(profile, job),
        })
        .filter(|scored| scored.match_score >= MATCH_THRESHOLD)
        .collect();

    ranked.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    ranked
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
