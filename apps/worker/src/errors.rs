use thiserror::Error;

/// Failure reported by one of the external stores (profiles, catalog, ledger).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// The ledger refused the write, e.g. a record for the same user/job
    /// already exists inside the dedup window.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// A failure that ends a pass early. The scheduler logs it and stays healthy.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("Failed to list auto-apply profiles: {0}")]
    Profiles(#[source] StoreError),

    #[error("Failed to load job catalog: {0}")]
    Catalog(#[source] StoreError),
}

/// A failure isolated to one profile. The pass moves on to the next profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to count today's applications: {0}")]
    Quota(#[source] StoreError),

    #[error("Failed to load resumes: {0}")]
    Resumes(#[source] StoreError),

    #[error("Failed to check recent applications: {0}")]
    Dedup(#[source] StoreError),
}
