use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::auto_apply::SchedulerSnapshot;
use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "auto-apply-worker"
    }))
}

/// GET /api/v1/auto-apply/status
/// Scheduler state and the outcome of the most recent pass.
pub async fn auto_apply_status_handler(State(state): State<AppState>) -> Json<SchedulerSnapshot> {
    Json(state.scheduler.snapshot())
}
