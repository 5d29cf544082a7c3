//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{chat, health, metrics};
use crate::middleware::{
    auth::{require_auth, AuthState},
    logging::log_request,
    metrics::track_request,
};
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes (no authentication required)
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    // Create middleware state
    let auth_state = AuthState::new(state.settings.clone());

    // Chat routes (POST /v1/chat), authenticated
    let chat_routes = Router::new()
        .route("/chat", post(chat::send_message))
        .layer(middleware::from_fn_with_state(
            auth_state.clone(),
            require_auth,
        ));

    // Metrics inspection routes, authenticated: request history can reveal
    // usage patterns
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::snapshot))
        .route("/metrics/requests", get(metrics::recent_requests))
        .layer(middleware::from_fn_with_state(auth_state, require_auth));

    // Combine all routes
    // Layer order: last added = outermost = runs first, so the metrics
    // observer sees every request, including auth short-circuits
    Router::new()
        .nest("/v1", chat_routes)
        .merge(metrics_routes)
        .merge(health_routes)
        .layer(create_cors_layer())
        // Custom request logging with trace IDs
        .layer(middleware::from_fn(log_request))
        // Request metrics observer (outermost)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_request,
        ))
        .with_state(state)
}

/// Create CORS layer with permissive settings for development
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            // Expose trace ID headers to clients
            "x-trace-id".parse().unwrap(),
            "x-request-id".parse().unwrap(),
        ])
}
