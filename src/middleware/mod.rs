//! Middleware module
//!
//! Contains HTTP middleware for authentication, request logging, and metrics.

pub mod auth;
pub mod logging;
pub mod metrics;

// Re-export commonly used items
pub use auth::{require_auth, AuthContext, AuthError, AuthState};
pub use logging::{log_request, TraceId, REQUEST_ID_HEADER, TRACE_ID_HEADER};
pub use metrics::track_request;
