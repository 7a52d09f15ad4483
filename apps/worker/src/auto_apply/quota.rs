//! Quota Tracker: daily application cap and the per-job dedup window.
//!
//! Both checks take `now` explicitly. Neither raises on "not allowed": a spent
//! quota or a recent application is a normal `0` / `false`.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::models::Profile;
use crate::store::ApplicationLedger;

/// Trailing window, in days, during which the same job is not applied to twice.
pub const DEDUP_WINDOW_DAYS: i64 = 7;

/// Which midnight starts "today" for the daily cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBoundary {
    Local,
    Utc,
}

impl FromStr for DayBoundary {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(DayBoundary::Local),
            "utc" => Ok(DayBoundary::Utc),
            other => Err(format!("expected 'local' or 'utc', got '{other}'")),
        }
    }
}

/// Start of the calendar day containing `now`, under `boundary`.
pub fn day_start(now: DateTime<Utc>, boundary: DayBoundary) -> DateTime<Utc> {
    let utc_midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();

    match boundary {
        DayBoundary::Utc => utc_midnight,
        DayBoundary::Local => {
            let local_midnight = now
                .with_timezone(&Local)
                .date_naive()
                .and_time(NaiveTime::MIN);
            first_valid_instant(local_midnight, |naive| {
                Local
                    .from_local_datetime(naive)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            })
            .unwrap_or(utc_midnight)
        }
    }
}

/// Longest DST gap searched past local midnight.
const MAX_GAP_MINUTES: i64 = 180;

/// First instant at or after `local_midnight` that exists on the local clock.
/// Some DST transitions skip midnight; those days start at the end of the gap.
fn first_valid_instant<F>(local_midnight: NaiveDateTime, resolve: F) -> Option<DateTime<Utc>>
where
    F: Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
{
    (0..=MAX_GAP_MINUTES)
        .map(|minutes| local_midnight + Duration::minutes(minutes))
        .find_map(|candidate| resolve(&candidate))
}

/// Oldest `applied_at` that still blocks a repeat application at `now`.
pub fn dedup_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(DEDUP_WINDOW_DAYS)
}

/// `max(0, daily_limit - today_count)`.
pub fn remaining_quota(daily_limit: u32, today_count: u32) -> u32 {
    daily_limit.saturating_sub(today_count)
}

/// Ledger-backed quota and dedup checks for one pass.
#[derive(Clone)]
pub struct QuotaTracker {
    ledger: Arc<dyn ApplicationLedger>,
    boundary: DayBoundary,
}

impl QuotaTracker {
    pub fn new(ledger: Arc<dyn ApplicationLedger>, boundary: DayBoundary) -> Self {
        Self { ledger, boundary }
    }

    /// Applications the profile may still submit today.
    pub async fn remaining_today(
        &self,
        profile: &Profile,
        now: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let since = day_start(now, self.boundary);
        let today_count = self
            .ledger
            .count_applications_since(&profile.user_id, since)
            .await?;
        Ok(remaining_quota(profile.daily_limit, today_count))
    }

    /// Point lookup: true when no application for the pair falls in the window.
    pub async fn can_apply(
        &self,
        user_id: &str,
        job_id: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let recent = self
            .ledger
            .has_application_since(user_id, job_id, dedup_cutoff(now))
            .await?;
        Ok(!recent)
    }
}
