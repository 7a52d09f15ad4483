use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tag recorded on an application when the user has no resume tailored to the job's industry.
pub const DEFAULT_RESUME_TAG: &str = "Default";

/// Industry-tailored resume owned by a user. Only the industry tag matters here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: i32,
    pub user_id: String,
    pub industry: String,
}
