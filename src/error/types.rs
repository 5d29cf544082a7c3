//! API error types
//!
//! A small taxonomy of immutable, serializable error values. Every variant
//! carries an HTTP status code and converts to the stable wire envelope
//! `{"status":"error","code",...,"message",...,"timestamp",...,"details"?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Generic message returned on the wire for unexpected faults. Diagnostic
/// detail stays in the operator logs.
pub const MSG_INTERNAL_ERROR: &str = "Error interno del servidor.";

/// Convenience alias for fallible handler results.
pub type AppResult<T> = Result<T, AppError>;

/// Error-kind tag. Not part of the wire envelope; the HTTP code is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Custom,
    Internal,
}

/// Immutable application error value.
///
/// Constructed at the error site through the factory methods below and
/// never mutated afterwards.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub code: u16,
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    fn new(kind: ErrorKind, message: String, code: u16, details: Option<Value>) -> Self {
        Self {
            kind,
            message,
            code,
            details,
            timestamp: Utc::now(),
        }
    }

    /// 401: missing or invalid credentials
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message.into(), 401, None)
    }

    /// 403: no credential presented
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message.into(), 403, None)
    }

    /// 404: resource absent
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message.into(), 404, None)
    }

    /// 400: malformed input, scoped to a single request field.
    ///
    /// `details.parameter` names the failing field.
    pub fn validation(message: impl Into<String>, parameter: &str) -> Self {
        Self::new(
            ErrorKind::Validation,
            message.into(),
            400,
            Some(serde_json::json!({ "parameter": parameter })),
        )
    }

    /// Caller-chosen status code.
    ///
    /// Codes outside `[100, 600)` are coerced to 500 with a warning.
    ///
    /// # Panics
    ///
    /// Panics if `message` is empty after trimming. An empty message is a
    /// bug at the call site, not a request-level failure, so it uses the
    /// panic channel rather than the returned-error channel.
    pub fn custom(
        message: impl Into<String>,
        code: u16,
        details: Option<Value>,
        should_log: bool,
    ) -> Self {
        let message = message.into();
        assert!(
            !message.trim().is_empty(),
            "AppError::custom requires a non-empty message"
        );

        let code = if (100..600).contains(&code) {
            code
        } else {
            tracing::warn!(
                requested_code = code,
                "Out-of-range error code coerced to 500"
            );
            500
        };

        if should_log {
            tracing::error!(code, message = %message, "Application error");
        }

        Self::new(ErrorKind::Custom, message, code, details)
    }

    /// 500: unexpected fault. Always logged; the wire envelope carries only
    /// the generic message so internals never leak to the client.
    pub fn internal(source: impl std::fmt::Display) -> Self {
        tracing::error!(error = %source, "Internal server error");
        Self::new(ErrorKind::Internal, MSG_INTERNAL_ERROR.to_string(), 500, None)
    }

    /// HTTP status for this error. The constructors keep `code` inside the
    /// valid range, so the fallback only covers hand-built values.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Lossless conversion to the wire envelope.
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: "error".to_string(),
            code: self.code,
            message: self.message.clone(),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            details: self.details.clone(),
        }
    }
}

/// JSON error envelope sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: String,
    pub code: u16,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_status_codes() {
        assert_eq!(AppError::unauthorized("no").code, 401);
        assert_eq!(AppError::forbidden("no").code, 403);
        assert_eq!(AppError::not_found("missing").code, 404);
        assert_eq!(AppError::validation("bad", "userId").code, 400);
        assert_eq!(AppError::internal("boom").code, 500);
    }

    #[test]
    fn test_custom_code_preserved_in_range() {
        let err = AppError::custom("teapot", 418, None, false);
        assert_eq!(err.code, 418);
        assert_eq!(err.kind, ErrorKind::Custom);
    }

    #[test]
    fn test_custom_code_sanitized_out_of_range() {
        assert_eq!(AppError::custom("x", 999, None, false).code, 500);
        assert_eq!(AppError::custom("x", 42, None, false).code, 500);
        assert_eq!(AppError::custom("x", 600, None, false).code, 500);
    }

    #[test]
    #[should_panic(expected = "non-empty message")]
    fn test_custom_empty_message_panics() {
        let _ = AppError::custom("   ", 400, None, false);
    }

    #[test]
    fn test_validation_names_parameter() {
        let err = AppError::validation("userMessage is required", "userMessage");
        let details = err.details.expect("validation errors carry details");
        assert_eq!(details["parameter"], "userMessage");
    }

    #[test]
    fn test_internal_uses_generic_wire_message() {
        let err = AppError::internal("database connection refused");
        assert_eq!(err.message, MSG_INTERNAL_ERROR);
        assert!(err.details.is_none());
    }

    #[test]
    fn test_envelope_round_trip() {
        let err = AppError::custom(
            "quota exceeded",
            429,
            Some(serde_json::json!({ "limit": 100 })),
            false,
        );
        let json = serde_json::to_string(&err.envelope()).unwrap();
        let parsed: ErrorEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.status, "error");
        assert_eq!(parsed.code, 429);
        assert_eq!(parsed.message, "quota exceeded");
        assert_eq!(parsed.timestamp, err.envelope().timestamp);
        assert_eq!(parsed.details.unwrap()["limit"], 100);
    }

    #[test]
    fn test_envelope_omits_absent_details() {
        let value = serde_json::to_value(AppError::unauthorized("no").envelope()).unwrap();
        assert!(value.get("details").is_none());
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], 401);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::forbidden("no").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
