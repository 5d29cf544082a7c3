//! Authentication middleware
//!
//! Dispatches between two credential types before any handler runs: a
//! static API-key whitelist presented via `X-API-KEY`, and HS256 JWTs
//! presented via `Authorization: Bearer`. The whitelist and the signing
//! secret are loaded once at process start; see
//! [`crate::config::settings::resolve_jwt_secret`] for the startup
//! precondition on the secret.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, Validation};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppError;

/// Header name for API key authentication.
pub const API_KEY_HEADER: &str = "x-api-key";

// Client-facing rejection messages. These are part of the wire contract and
// must stay byte-for-byte stable.
pub const MSG_INVALID_API_KEY: &str = "API Key inválida.";
pub const MSG_MISSING_TOKEN: &str = "Token de autenticación no proporcionado.";
pub const MSG_EXPIRED_TOKEN: &str = "El token de autenticación ha expirado.";
pub const MSG_MALFORMED_TOKEN: &str = "Token de autenticación inválido o malformado.";
pub const MSG_NO_CREDENTIALS: &str =
    "Acceso denegado. Se requiere una API Key o un token de autenticación.";
pub const MSG_SERVER_MISCONFIGURED: &str = "Error de configuración del servidor.";

// ============================================================================
// Auth Context
// ============================================================================

/// Credential resolved for one request.
///
/// Injected into request extensions after successful authentication and
/// dropped with the request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method")]
pub enum AuthContext {
    #[serde(rename = "apiKey")]
    ApiKey {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
    #[serde(rename = "jwt")]
    Jwt { user: Value },
}

impl AuthContext {
    /// The credential method tag, matching the serialized form.
    pub fn method(&self) -> &'static str {
        match self {
            AuthContext::ApiKey { .. } => "apiKey",
            AuthContext::Jwt { .. } => "jwt",
        }
    }
}

// ============================================================================
// Authentication Errors
// ============================================================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// API key presented but not in the whitelist
    InvalidApiKey,
    /// Authorization header present but the token segment is empty
    MissingToken,
    /// Token signature is valid but the token has expired
    ExpiredToken,
    /// Token is malformed or its signature does not verify
    MalformedToken,
    /// Neither credential type was presented
    NoCredentials,
    /// Signing secret unavailable at verification time
    MissingSecret,
    /// Unexpected fault during verification
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let error = match self {
            AuthError::InvalidApiKey => AppError::unauthorized(MSG_INVALID_API_KEY),
            AuthError::MissingToken => AppError::unauthorized(MSG_MISSING_TOKEN),
            AuthError::ExpiredToken => AppError::unauthorized(MSG_EXPIRED_TOKEN),
            AuthError::MalformedToken => AppError::unauthorized(MSG_MALFORMED_TOKEN),
            AuthError::NoCredentials => AppError::forbidden(MSG_NO_CREDENTIALS),
            AuthError::MissingSecret => {
                // The startup check is the primary safeguard; reaching this
                // arm means it was bypassed (hand-built settings, bad wiring).
                tracing::error!("JWT secret unavailable at verification time");
                AppError::custom(MSG_SERVER_MISCONFIGURED, 500, None, false)
            }
            AuthError::Internal(message) => AppError::internal(message),
        };
        error.into_response()
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Authentication state required by the middleware
#[derive(Clone)]
pub struct AuthState {
    pub settings: Arc<Settings>,
}

impl AuthState {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }
}

/// Middleware to require either a whitelisted API key or a valid JWT
///
/// Dispatch order:
/// 1. `X-API-KEY` header present: accept iff whitelisted, else 401
/// 2. `Authorization` header present: verify the bearer token, with
///    distinct 401s for an empty segment, an expired token, and a
///    malformed token; 500 if the secret is unavailable
/// 3. Neither header: 403
///
/// On success the resolved [`AuthContext`] is injected into request
/// extensions for downstream handlers.
pub async fn require_auth(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if let Some(api_key) = header_str(&request, API_KEY_HEADER) {
        if auth.settings.api_keys.contains(api_key) {
            tracing::debug!("API key authenticated");
            let context = AuthContext::ApiKey {
                api_key: api_key.to_string(),
            };
            request.extensions_mut().insert(context);
            return Ok(next.run(request).await);
        }

        tracing::warn!(path = %request.uri().path(), "Invalid API key");
        return Err(AuthError::InvalidApiKey);
    }

    if let Some(authorization) = header_str(&request, "authorization") {
        let token = authorization
            .strip_prefix("Bearer ")
            .map(str::trim)
            .unwrap_or_default();
        if token.is_empty() {
            tracing::warn!(path = %request.uri().path(), "Bearer token missing");
            return Err(AuthError::MissingToken);
        }

        let Some(secret) = auth.settings.jwt_secret.as_deref() else {
            return Err(AuthError::MissingSecret);
        };

        let claims = verify_token(token, secret)?;
        tracing::debug!("JWT authenticated");
        request
            .extensions_mut()
            .insert(AuthContext::Jwt { user: claims });
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Request without credentials");
    Err(AuthError::NoCredentials)
}

/// Verify an HS256 token's signature and expiry against the shared secret.
///
/// Returns the decoded claims mapping on success. Verification failures are
/// classified into the expired / malformed buckets; anything the token
/// library reports outside those (crypto backend faults) is surfaced as an
/// internal error so it reaches the operator log.
fn verify_token(token: &str, secret: &str) -> Result<Value, AuthError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Value>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            JwtErrorKind::InvalidToken
            | JwtErrorKind::InvalidSignature
            | JwtErrorKind::ImmatureSignature
            | JwtErrorKind::InvalidAlgorithm
            | JwtErrorKind::MissingRequiredClaim(_)
            | JwtErrorKind::Base64(_)
            | JwtErrorKind::Json(_)
            | JwtErrorKind::Utf8(_) => AuthError::MalformedToken,
            _ => AuthError::Internal(format!("token verification failed: {err}")),
        })
}

fn header_str<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|value| value.to_str().ok())
}

// ============================================================================
// Tests
// ============================================================================
