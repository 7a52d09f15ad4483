use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::{ApplicationLedger, JobCatalog, ProfileStore};
use crate::auto_apply::quota::dedup_cutoff;
use crate::errors::StoreError;
use crate::models::{Application, Job, NewApplication, Profile, ProfileRow, Resume};

/// PostgreSQL-backed store over the web app's schema.
///
/// `timestamp` columns are read as UTC wall-clock values: converted with
/// `AT TIME ZONE 'UTC'` on the way out and bound as naive UTC on the way in.
/// Pool sessions run with `TIME ZONE 'UTC'` (see `db::create_pool`). Rows the
/// web app writes through `defaultNow()` record its own session zone, so that
/// database must also run in UTC for "today" and the dedup window to line up.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn list_auto_apply_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let rows: Vec<ProfileRow> = sqlx::query_as(
            r#"
            SELECT user_id, industries, location, auto_mode, daily_limit, subscription_status,
                   trial_ends_at AT TIME ZONE 'UTC' AS trial_ends_at
            FROM user_profiles
            WHERE auto_mode = true
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn list_resumes(&self, user_id: &str) -> Result<Vec<Resume>, StoreError> {
        let resumes: Vec<Resume> = sqlx::query_as(
            "SELECT id, user_id, industry FROM tailored_resumes WHERE user_id = $1 ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(resumes)
    }
}

#[async_trait]
impl JobCatalog for PgStore {
    async fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        // Newest first; this order is the tie-break for equal match scores.
        let jobs: Vec<Job> = sqlx::query_as(
            r#"
            SELECT id, title, company, location, industry, source, url,
                   posted_at AT TIME ZONE 'UTC' AS posted_at
            FROM jobs
            ORDER BY created_at DESC NULLS LAST, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }
}

#[async_trait]
impl ApplicationLedger for PgStore {
    async fn count_applications_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE user_id = $1 AND applied_at >= $2",
        )
        .bind(user_id)
        .bind(since.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u32)
    }

    async fn has_application_since(
        &self,
        user_id: &str,
        job_id: i32,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM applications
                WHERE user_id = $1 AND job_id = $2 AND applied_at >= $3
            )
            "#,
        )
        .bind(user_id)
        .bind(job_id)
        .bind(since.naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_application(
        &self,
        record: NewApplication,
    ) -> Result<Application, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serialize check-then-insert per user for the rest of the transaction.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&record.user_id)
            .execute(&mut *tx)
            .await?;

        let duplicate: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM applications
                WHERE user_id = $1 AND job_id = $2 AND applied_at >= $3
            )
            "#,
        )
        .bind(&record.user_id)
        .bind(record.job_id)
        .bind(dedup_cutoff(record.applied_at).naive_utc())
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            debug!(
                "Refusing duplicate application: user {} job {}",
                record.user_id, record.job_id
            );
            return Err(StoreError::Conflict(format!(
                "job {} already applied to by {} within the dedup window",
                record.job_id, record.user_id
            )));
        }

        let application: Application = sqlx::query_as(
            r#"
            INSERT INTO applications
                (user_id, job_id, job_title, company, location, source,
                 status, resume_used, match_score, auto_applied, applied_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, job_id, job_title, company, location, source,
                      status, resume_used, match_score, auto_applied,
                      applied_at AT TIME ZONE 'UTC' AS applied_at
            "#,
        )
        .bind(&record.user_id)
        .bind(record.job_id)
        .bind(&record.job_title)
        .bind(&record.company)
        .bind(&record.location)
        .bind(&record.source)
        .bind(&record.status)
        .bind(&record.resume_used)
        .bind(record.match_score)
        .bind(record.auto_applied)
        .bind(record.applied_at.naive_utc())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(application)
    }
}
