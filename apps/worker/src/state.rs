use crate::auto_apply::AutoApplyScheduler;

/// Shared state injected into the ops route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Read-only here; the routes never trigger a pass.
    pub scheduler: AutoApplyScheduler,
}
