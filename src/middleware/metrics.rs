//! Request metrics middleware
//!
//! The observer coupling between the HTTP transport and the
//! [`MetricsRegistry`]: counts the request at arrival, then records status
//! classification, elapsed time, and a request-log entry exactly once, when
//! the response has been produced. Layered outermost so rejections from
//! auth and validation are observed too.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::MetricsRegistry;

/// Middleware to record request metrics
pub async fn track_request(
    State(registry): State<Arc<MetricsRegistry>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    registry.observe_request();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    registry.record_completion(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}
