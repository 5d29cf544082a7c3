//! Request-body validation for the chat endpoint.
//!
//! Validation here is intentionally shallow: the chat endpoint accepts an
//! arbitrary JSON object and only two fields are contractual. Checks run in
//! declaration order and the first failing field short-circuits, so the 400
//! response always names exactly one parameter.

use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Required string fields of a chat request, in validation order.
pub const REQUIRED_FIELDS: [&str; 2] = ["userId", "userMessage"];

/// Validate a chat request body.
///
/// Each required field must exist, be a JSON string, and be non-empty after
/// trimming. Pure function of the input; no side effects.
pub fn validate_chat_request(body: &Value) -> AppResult<()> {
    for field in REQUIRED_FIELDS {
        let valid = matches!(body.get(field), Some(Value::String(s)) if !s.trim().is_empty());
        if !valid {
            return Err(AppError::validation(
                format!("El parámetro '{field}' es requerido y debe ser una cadena no vacía."),
                field,
            ));
        }
    }

    Ok(())
}
