//! Health check endpoints
//!
//! This module provides health check endpoints for monitoring
//! and container orchestration (Kubernetes, ECS, etc.)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Response for the main health check endpoint
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
}

/// Response for readiness probe
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub config_loaded: bool,
    pub jwt_secret_configured: bool,
    pub api_keys_loaded: bool,
}

/// Response for liveness probe
#[derive(Serialize)]
pub struct LivenessResponse {
    pub alive: bool,
}

/// Main health check endpoint
///
/// Returns overall service health status with version and uptime information.
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Readiness probe endpoint
///
/// Returns whether the service is ready to accept traffic. The credential
/// checks are informational: an empty whitelist still leaves the JWT path
/// usable, so only a loaded configuration gates readiness.
///
/// GET /ready
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let checks = ReadinessChecks {
        config_loaded: true,
        jwt_secret_configured: state.settings.jwt_secret.is_some(),
        api_keys_loaded: !state.settings.api_keys.is_empty(),
    };

    let ready = checks.config_loaded && checks.jwt_secret_configured;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    if !ready {
        tracing::warn!(checks = ?checks, "Service not ready");
    }

    (status, Json(ReadinessResponse { ready, checks }))
}

/// Liveness probe endpoint
///
/// GET /liveness
pub async fn liveness() -> Json<LivenessResponse> {
    // Simple liveness check - if we can respond, we're alive
    Json(LivenessResponse { alive: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[tokio::test]
    async fn test_health_reports_uptime_and_environment() {
        let state = AppState::new(Settings::default());
        let Json(response) = health_check(State(state)).await;

        assert_eq!(response.status, "healthy");
        assert_eq!(response.environment, "development");
    }

    #[tokio::test]
    async fn test_readiness_requires_secret() {
        // Default settings carry no secret; readiness must fail.
        let state = AppState::new(Settings::default());
        let (status, Json(response)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!response.ready);

        let mut settings = Settings::default();
        settings.jwt_secret = Some("a-real-secret".to_string());
        let state = AppState::new(settings);
        let (status, Json(response)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.ready);
        assert!(!response.checks.api_keys_loaded);
    }

    #[tokio::test]
    async fn test_liveness() {
        let Json(response) = liveness().await;
        assert!(response.alive);
    }
}
