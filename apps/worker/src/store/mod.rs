//! Store seams: the narrow interfaces the auto-apply core consumes.
//!
//! `PgStore` implements all three against the web app's PostgreSQL schema.
//! Tests use `memory::InMemoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{Application, Job, NewApplication, Profile, Resume};

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

/// Profiles and the resumes attached to them.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Profiles with `autoMode` on. Subscription filtering is left to the caller.
    async fn list_auto_apply_profiles(&self) -> Result<Vec<Profile>, StoreError>;

    async fn list_resumes(&self, user_id: &str) -> Result<Vec<Resume>, StoreError>;
}

/// Snapshot of the job catalog, in catalog order.
#[async_trait]
pub trait JobCatalog: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError>;
}

/// The application ledger.
#[async_trait]
pub trait ApplicationLedger: Send + Sync {
    /// Applications of any job for `user_id` with `applied_at >= since`.
    async fn count_applications_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError>;

    /// Whether `(user_id, job_id)` has an application with `applied_at >= since`.
    async fn has_application_since(
        &self,
        user_id: &str,
        job_id: i32,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Inserts exactly one record. Implementations must refuse the write with
    /// `StoreError::Conflict` when the pair already has a record inside the
    /// dedup window ending at `record.applied_at`.
    async fn create_application(&self, record: NewApplication)
        -> Result<Application, StoreError>;
}
