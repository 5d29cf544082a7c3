//! Chat API endpoint
//!
//! This module implements the POST /v1/chat endpoint. The gateway itself
//! does not talk to a model backend; the handler validates the request,
//! records the event, and acknowledges the message so the middleware chain
//! in front of it can be exercised end to end.

use axum::{extract::State, Extension, Json};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthContext;
use crate::schemas::{ChatReply, SuccessResponse};
use crate::server::state::AppState;
use crate::validation::validate_chat_request;

/// Handle POST /v1/chat
///
/// The body is arbitrary JSON; only `userId` and `userMessage` are
/// contractual and both must be non-blank strings.
pub async fn send_message(
    State(state): State<AppState>,
    auth: Option<Extension<AuthContext>>,
    Json(body): Json<Value>,
) -> AppResult<Json<SuccessResponse<ChatReply>>> {
    validate_chat_request(&body)?;

    let user_id = body["userId"].as_str().unwrap_or_default().to_string();
    let message = body["userMessage"].as_str().unwrap_or_default().trim().to_string();

    state.metrics.increment("chat_messages");

    tracing::info!(
        user_id = %user_id,
        auth_method = auth.as_ref().map(|Extension(context)| context.method()).unwrap_or("none"),
        message_chars = message.chars().count(),
        "Chat message received"
    );

    let reply = ChatReply {
        message_id: Uuid::new_v4().to_string(),
        user_id,
        reply: format!("Mensaje recibido: {message}"),
    };

    Ok(Json(SuccessResponse::new(reply)))
}
