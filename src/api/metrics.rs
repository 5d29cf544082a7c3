//! Metrics inspection endpoints
//!
//! Read-only views over the [`crate::metrics::MetricsRegistry`]: a full
//! snapshot and the recent-request log. Both sit behind authentication;
//! request history can reveal usage patterns.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::metrics::{resolve_recent_limit, MetricsSnapshot, RequestLogEntry};
use crate::schemas::SuccessResponse;
use crate::server::state::AppState;

/// Query parameters for the recent-requests endpoint.
///
/// `limit` is kept as a raw string so non-numeric input degrades to the
/// default instead of a deserialization 400.
#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<String>,
}

/// Payload for the recent-requests endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecentRequests {
    pub count: usize,
    pub requests: Vec<RequestLogEntry>,
}

/// Handle GET /metrics
pub async fn snapshot(State(state): State<AppState>) -> Json<SuccessResponse<MetricsSnapshot>> {
    Json(SuccessResponse::new(state.metrics.snapshot()))
}

/// Handle GET /metrics/requests
///
/// Returns up to `limit` most recent completed requests, most recent
/// first. Missing, non-numeric, or non-positive `limit` falls back to 10.
pub async fn recent_requests(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<SuccessResponse<RecentRequests>> {
    let limit = resolve_recent_limit(query.limit.as_deref());
    let requests = state.metrics.recent_requests(limit);

    Json(SuccessResponse::new(RecentRequests {
        count: requests.len(),
        requests,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_router() -> (Router, AppState) {
        let state = AppState::new(Settings::default());
        let router = Router::new()
            .route("/metrics", get(snapshot))
            .route("/metrics/requests", get(recent_requests))
            .with_state(state.clone());
        (router, state)
    }

    async fn get_json(router: Router, uri: &str) -> serde_json::Value {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_envelope() {
        let (router, state) = test_router();
        state.metrics.observe_request();
        state
            .metrics
            .record_completion("GET", "/v1/chat", 200, Duration::from_millis(3));
        state.metrics.increment("chat_messages");

        let body = get_json(router, "/metrics").await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["total_requests"], 1);
        assert_eq!(body["data"]["successful_responses"], 1);
        assert_eq!(body["data"]["custom_counters"]["chat_messages"], 1);
        assert!(body["data"]["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn test_recent_requests_limit_handling() {
        let (router, state) = test_router();
        for i in 0..15 {
            state.metrics.observe_request();
            state.metrics.record_completion(
                "GET",
                &format!("/r/{i}"),
                200,
                Duration::from_millis(1),
            );
        }

        // Explicit limit
        let body = get_json(router.clone(), "/metrics/requests?limit=3").await;
        assert_eq!(body["data"]["count"], 3);
        assert_eq!(body["data"]["requests"][0]["path"], "/r/14");

        // Non-numeric limit falls back to the default of 10
        let body = get_json(router.clone(), "/metrics/requests?limit=abc").await;
        assert_eq!(body["data"]["count"], 10);

        // Omitted limit uses the default too
        let body = get_json(router, "/metrics/requests").await;
        assert_eq!(body["data"]["count"], 10);
    }
}
