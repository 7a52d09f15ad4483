//! In-memory store for tests, with failure injection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ApplicationLedger, JobCatalog, ProfileStore};
use crate::auto_apply::quota::dedup_cutoff;
use crate::errors::StoreError;
use crate::models::{Application, Job, NewApplication, Profile, Resume, APPLIED_STATUS};

#[derive(Default)]
pub struct InMemoryStore {
    profiles: Mutex<Vec<Profile>>,
    jobs: Mutex<Vec<Job>>,
    resumes: Mutex<Vec<Resume>>,
    applications: Mutex<Vec<Application>>,
    next_id: AtomicI32,
    fail_profiles: AtomicBool,
    fail_catalog: AtomicBool,
    fail_resumes_for: Mutex<HashSet<String>>,
    fail_writes_for: Mutex<HashSet<i32>>,
    catalog_reads: AtomicI32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(1),
            ..Default::default()
        }
    }

    pub fn add_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().push(profile);
    }

    pub fn add_job(&self, job: Job) {
        self.jobs.lock().unwrap().push(job);
    }

    pub fn add_resume(&self, user_id: &str, industry: &str) {
        let mut resumes = self.resumes.lock().unwrap();
        let id = resumes.len() as i32 + 1;
        resumes.push(Resume {
            id,
            user_id: user_id.to_string(),
            industry: industry.to_string(),
        });
    }

    /// Inserts a ledger row directly, bypassing the dedup check.
    pub fn seed_application(&self, user_id: &str, job_id: i32, applied_at: DateTime<Utc>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.applications.lock().unwrap().push(Application {
            id,
            user_id: user_id.to_string(),
            job_id,
            job_title: format!("Seeded job {job_id}"),
            company: "Seeded Co".to_string(),
            location: "Nowhere".to_string(),
            source: None,
            status: APPLIED_STATUS.to_string(),
            resume_used: "Default".to_string(),
            match_score: 70,
            auto_applied: false,
            applied_at,
        });
    }

    pub fn fail_profile_listing(&self) {
        self.fail_profiles.store(true, Ordering::SeqCst);
    }

    pub fn fail_catalog(&self) {
        self.fail_catalog.store(true, Ordering::SeqCst);
    }

    pub fn fail_resumes_for(&self, user_id: &str) {
        self.fail_resumes_for
            .lock()
            .unwrap()
            .insert(user_id.to_string());
    }

    pub fn fail_writes_for(&self, job_id: i32) {
        self.fail_writes_for.lock().unwrap().insert(job_id);
    }

    pub fn clear_write_failures(&self) {
        self.fail_writes_for.lock().unwrap().clear();
    }

    pub fn applications(&self) -> Vec<Application> {
        self.applications.lock().unwrap().clone()
    }

    pub fn applications_for(&self, user_id: &str) -> Vec<Application> {
        self.applications()
            .into_iter()
            .filter(|app| app.user_id == user_id)
            .collect()
    }

    pub fn catalog_reads(&self) -> i32 {
        self.catalog_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn list_auto_apply_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        if self.fail_profiles.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("profiles offline".to_string()));
        }
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.auto_mode)
            .cloned()
            .collect())
    }

    async fn list_resumes(&self, user_id: &str) -> Result<Vec<Resume>, StoreError> {
        if self.fail_resumes_for.lock().unwrap().contains(user_id) {
            return Err(StoreError::Unavailable("resumes offline".to_string()));
        }
        Ok(self
            .resumes
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobCatalog for InMemoryStore {
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        self.catalog_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("catalog offline".to_string()));
        }
        Ok(self.jobs.lock().unwrap().clone())
    }
}

#[async_trait]
impl ApplicationLedger for InMemoryStore {
    async fn count_applications_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|app| app.user_id == user_id && app.applied_at >= since)
            .count() as u32)
    }

    async fn has_application_since(
        &self,
        user_id: &str,
        job_id: i32,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .any(|app| app.user_id == user_id && app.job_id == job_id && app.applied_at >= since))
    }

    async fn create_application(
        &self,
        record: NewApplication,
    ) -> Result<Application, StoreError> {
        if self.fail_writes_for.lock().unwrap().contains(&record.job_id) {
            return Err(StoreError::Unavailable(format!(
                "write rejected for job {}",
                record.job_id
            )));
        }

        let mut applications = self.applications.lock().unwrap();
        let cutoff = dedup_cutoff(record.applied_at);
        if applications.iter().any(|app| {
            app.user_id == record.user_id && app.job_id == record.job_id && app.applied_at >= cutoff
        }) {
            return Err(StoreError::Conflict(format!(
                "job {} already applied to by {} within the dedup window",
                record.job_id, record.user_id
            )));
        }

        let application = Application {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: record.user_id,
            job_id: record.job_id,
            job_title: record.job_title,
            company: record.company,
            location: record.location,
            source: record.source,
            status: record.status,
            resume_used: record.resume_used,
            match_score: record.match_score,
            auto_applied: record.auto_applied,
            applied_at: record.applied_at,
        };
        applications.push(application.clone());
        Ok(application)
    }
}
