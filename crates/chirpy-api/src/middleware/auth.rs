//! Authentication Middleware
//!
//! `require_auth` validates the bearer token on user endpoints and makes the
//! caller available to handlers via Axum's Extension. `require_service_key`
//! guards the payment provider webhook.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use chirpy_auth::{AuthError, AuthGateway, HeaderError, TokenError};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::models::ErrorResponse;

/// Authenticated caller extracted from the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Map an authorization failure onto an HTTP error
pub fn auth_error_response(err: &AuthError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, message, code) = match err {
        AuthError::Header(HeaderError::MissingHeader) => (
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
            "MISSING_AUTH",
        ),
        AuthError::Header(HeaderError::MalformedHeader(_)) => (
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header format. Expected 'Bearer <token>'".to_string(),
            "INVALID_AUTH_FORMAT",
        ),
        AuthError::Token(TokenError::Expired) => (
            StatusCode::UNAUTHORIZED,
            "Token has expired".to_string(),
            "TOKEN_EXPIRED",
        ),
        AuthError::Token(TokenError::Malformed(_) | TokenError::BadSignature) => (
            StatusCode::UNAUTHORIZED,
            format!("Invalid token: {}", err),
            "INVALID_TOKEN",
        ),
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            err.to_string(),
            "INVALID_CREDENTIALS",
        ),
        AuthError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            err.to_string(),
            "UNAUTHORIZED",
        ),
        AuthError::Token(TokenError::SigningFailed(_))
        | AuthError::Password(_)
        | AuthError::Store(_) => {
            error!("Authentication backend failure: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "INTERNAL_ERROR",
            )
        }
    };

    (status, Json(ErrorResponse::with_code(message, code)))
}

/// Authentication middleware for user endpoints
///
/// Reads `Authorization: Bearer <token>`, validates signature, issuer and
/// expiry, and injects [`AuthUser`] into request extensions.
///
/// # Errors
/// Returns 401 Unauthorized if:
/// - The Authorization header is missing
/// - The header is not a well-formed bearer credential
/// - The token is invalid or expired
pub async fn require_auth(
    State(gateway): State<Arc<AuthGateway>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let user_id = gateway.authorize(request.headers()).map_err(|e| {
        debug!("Rejected {} {}: {}", request.method(), request.uri().path(), e);
        auth_error_response(&e)
    })?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Middleware for server-to-server calls authenticated with `Authorization: ApiKey`
pub async fn require_service_key(
    State(gateway): State<Arc<AuthGateway>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    gateway
        .authorize_service_call(request.headers())
        .map_err(|e| auth_error_response(&e))?;

    Ok(next.run(request).await)
}
