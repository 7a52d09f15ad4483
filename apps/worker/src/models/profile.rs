use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Daily application cap applied when a profile carries none (or a non-positive one).
pub const DEFAULT_DAILY_LIMIT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trial,
    Canceled,
    PastDue,
    /// Any value the billing side writes that this worker does not know about.
    Unknown,
}

impl SubscriptionStatus {
    /// Parses the `subscription_status` column. A missing value means the
    /// profile never left its initial trial.
    pub fn from_db(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None => SubscriptionStatus::Trial,
            Some("active") => SubscriptionStatus::Active,
            Some("trial") => SubscriptionStatus::Trial,
            Some("canceled") | Some("cancelled") => SubscriptionStatus::Canceled,
            Some("past_due") => SubscriptionStatus::PastDue,
            Some(_) => SubscriptionStatus::Unknown,
        }
    }
}

/// Raw `user_profiles` row as stored by the web app.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: String,
    pub industries: Option<Vec<String>>,
    pub location: Option<String>,
    pub auto_mode: Option<bool>,
    pub daily_limit: Option<i32>,
    pub subscription_status: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
}

/// A user's job-search targeting and auto-apply policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub industries: Vec<String>,
    pub location: Option<String>,
    pub auto_mode: bool,
    pub daily_limit: u32,
}

impl Profile {
    /// Whether the subscription allows auto-apply at `now`.
    ///
    /// `autoMode` gates everything; past that, only active subscriptions and
    /// trials ending strictly after `now` qualify. A trial with no end date
    /// does not qualify.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        if !self.auto_mode {
            return false;
        }
        match self.status {
            SubscriptionStatus::Active => true,
            SubscriptionStatus::Trial => self.trial_ends_at.is_some_and(|ends| ends > now),
            SubscriptionStatus::Canceled
            | SubscriptionStatus::PastDue
            | SubscriptionStatus::Unknown => false,
        }
    }

    pub fn has_industries(&self) -> bool {
        !self.industries.is_empty()
    }
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let daily_limit = match row.daily_limit {
            Some(limit) if limit > 0 => limit as u32,
            _ => DEFAULT_DAILY_LIMIT,
        };

        Profile {
            user_id: row.user_id,
            status: SubscriptionStatus::from_db(row.subscription_status.as_deref()),
            trial_ends_at: row.trial_ends_at,
            industries: row.industries.unwrap_or_default(),
            location: row.location,
            auto_mode: row.auto_mode.unwrap_or(false),
            daily_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn make_profile(status: SubscriptionStatus, trial_ends_at: Option<DateTime<Utc>>) -> Profile {
        Profile {
            user_id: "user-1".to_string(),
            status,
            trial_ends_at,
            industries: vec!["Tech".to_string()],
            location: Some("Sydney, NSW".to_string()),
            auto_mode: true,
            daily_limit: 5,
        }
    }

    #[test]
    fn test_active_subscription_is_eligible() {
        assert!(make_profile(SubscriptionStatus::Active, None).is_eligible(now()));
    }

    #[test]
    fn test_auto_mode_off_is_never_eligible() {
        let mut profile = make_profile(SubscriptionStatus::Active, None);
        profile.auto_mode = false;
        assert!(!profile.is_eligible(now()));
    }

    #[test]
    fn test_trial_requires_future_end() {
        let future = make_profile(SubscriptionStatus::Trial, Some(now() + Duration::days(3)));
        let past = make_profile(SubscriptionStatus::Trial, Some(now() - Duration::seconds(1)));
        let exact = make_profile(SubscriptionStatus::Trial, Some(now()));
        let open_ended = make_profile(SubscriptionStatus::Trial, None);

        assert!(future.is_eligible(now()));
        assert!(!past.is_eligible(now()));
        assert!(!exact.is_eligible(now()));
        assert!(!open_ended.is_eligible(now()));
    }

    #[test]
    fn test_canceled_and_past_due_are_ineligible() {
        assert!(!make_profile(SubscriptionStatus::Canceled, None).is_eligible(now()));
        assert!(!make_profile(SubscriptionStatus::PastDue, None).is_eligible(now()));
        assert!(!make_profile(SubscriptionStatus::Unknown, None).is_eligible(now()));
    }

    #[test]
    fn test_row_defaults() {
        let row = ProfileRow {
            user_id: "user-2".to_string(),
            industries: None,
            location: None,
            auto_mode: None,
            daily_limit: Some(0),
            subscription_status: None,
            trial_ends_at: None,
        };
        let profile = Profile::from(row);
        assert_eq!(profile.daily_limit, DEFAULT_DAILY_LIMIT);
        assert_eq!(profile.status, SubscriptionStatus::Trial);
        assert!(profile.industries.is_empty());
        assert!(!profile.auto_mode);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(SubscriptionStatus::from_db(Some("active")), SubscriptionStatus::Active);
        assert_eq!(SubscriptionStatus::from_db(Some("past_due")), SubscriptionStatus::PastDue);
        assert_eq!(SubscriptionStatus::from_db(Some("paused")), SubscriptionStatus::Unknown);
    }
}
