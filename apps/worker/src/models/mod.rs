// Data model shared by the store and the auto-apply pipeline.
// Profiles, jobs and resumes are read-only inputs; applications are append-only.

pub mod application;
pub mod job;
pub mod profile;
pub mod resume;

pub use application::{Application, NewApplication, APPLIED_STATUS};
pub use job::Job;
pub use profile::{Profile, ProfileRow, SubscriptionStatus};
pub use resume::{Resume, DEFAULT_RESUME_TAG};
