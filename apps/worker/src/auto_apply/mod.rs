// Auto-apply pipeline: score → quota → select → commit, driven by the scheduler.
// Everything below the scheduler takes `now` explicitly.

pub mod committer;
pub mod quota;
pub mod scheduler;
pub mod scoring;
pub mod selector;
pub mod service;

pub use scheduler::{AutoApplyScheduler, SchedulerSnapshot};
pub use scoring::RuleMatchScorer;
pub use service::AutoApplyService;
