//! API key extractor.
//!
//! Every `/api/v1` handler takes [`RequireApiKey`], which reads
//! `Authorization: Bearer <token>` and checks it against the auth cache.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::services::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid API token.
///
/// Holds the username the token belongs to.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireApiKey(username): RequireApiKey) -> impl IntoResponse {
///     format!("Hello, {username}!")
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireApiKey(pub String);

/// Error returned when the request is not authenticated.
#[derive(Debug)]
pub enum ApiKeyRejection {
    /// No bearer token in the request.
    Missing,
    /// Token not accepted.
    Invalid,
    /// Token store could not be queried.
    Unavailable,
}

impl IntoResponse for ApiKeyRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Missing => (StatusCode::UNAUTHORIZED, "token not provided"),
            Self::Invalid => (StatusCode::UNAUTHORIZED, "invalid token"),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "authentication unavailable",
            ),
        };

        let body = json!({
            "success": false,
            "message": message,
            "data": null,
        });
        (status, Json(body)).into_response()
    }
}

/// Token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireApiKey {
    type Rejection = ApiKeyRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiKeyRejection::Missing)?;

        match state.auth().authenticate(token).await {
            Ok(username) => {
                tracing::Span::current().record("username", username.as_str());
                Ok(Self(username))
            }
            Err(AuthError::NotProvided) => Err(ApiKeyRejection::Missing),
            Err(AuthError::InvalidToken) => Err(ApiKeyRejection::Invalid),
            Err(AuthError::Lookup(e)) => {
                error!(error = %e, "API token lookup failed");
                Err(ApiKeyRejection::Unavailable)
            }
        }
    }
}
