pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/auto-apply/status",
            get(health::auto_apply_status_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auto_apply::scheduler::{PassRunner, ScheduleConfig, TriggerSource};
    use crate::auto_apply::service::PassSummary;
    use crate::auto_apply::AutoApplyScheduler;
    use crate::errors::PassError;

    struct EmptyPass;

    #[async_trait]
    impl PassRunner for EmptyPass {
        async fn run_pass(&self) -> Result<PassSummary, PassError> {
            Ok(PassSummary::new(Uuid::new_v4(), Utc::now()))
        }
    }

    fn scheduler() -> AutoApplyScheduler {
        AutoApplyScheduler::new(Arc::new(EmptyPass), ScheduleConfig::default())
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let router = build_router(AppState {
            scheduler: scheduler(),
        });

        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "auto-apply-worker");
    }

    #[tokio::test]
    async fn test_status_reports_last_pass() {
        let scheduler = scheduler();
        scheduler.trigger(TriggerSource::Startup).await;
        let router = build_router(AppState {
            scheduler: scheduler.clone(),
        });

        let (status, body) = get_json(router, "/api/v1/auto-apply/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");
        assert_eq!(body["passes_run"], 1);
        assert_eq!(body["last_pass"]["source"], "startup");
        assert_eq!(body["last_pass"]["outcome"], "completed");
        assert_eq!(body["last_pass"]["summary"]["applications_committed"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let router = build_router(AppState {
            scheduler: scheduler(),
        });
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/auto-apply/run")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
