//! Axum extractors for authentication.
//!
//! Tokens arrive over one of two transports: an `Authorization: Bearer`
//! header or the `access_token` cookie. A present Authorization header
//! commits the request to header-based validation; an invalid header fails
//! the request even when a valid cookie is also present. This keeps API
//! clients and browser sessions from silently answering for each other.

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use super::cookie::{ACCESS_COOKIE_NAME, get_cookie};
use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthState;
use super::types::AuthenticatedUser;

/// Pull the bearer token out of the Authorization header, if one is present.
/// A header that is present but not bearer-shaped is an error, not "absent".
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthErrorKind> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthErrorKind::InvalidToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthErrorKind::InvalidToken)?;
    Ok(Some(token))
}

/// Core authentication logic shared by the extractors.
/// Returns the authenticated user or an error kind.
async fn authenticate_request<S>(
    parts: &Parts,
    state: &S,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthState + Send + Sync,
{
    // Header first; its presence commits, no fallback to cookies
    let token = match bearer_token(parts)? {
        Some(token) => token,
        None => get_cookie(&parts.headers, ACCESS_COOKIE_NAME)
            .ok_or(AuthErrorKind::MissingCredential)?,
    };

    let claims = state
        .jwt()
        .validate_access_token(token)
        .map_err(|_| AuthErrorKind::InvalidToken)?;

    // Resolve the subject to a live user record
    let user_id: i64 = claims.sub.parse().map_err(|_| AuthErrorKind::InvalidToken)?;
    let user = state
        .db()
        .users()
        .get_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user: {}", e);
            AuthErrorKind::DatabaseError
        })?
        .ok_or(AuthErrorKind::UserNotFound)?;

    if !user.is_active {
        return Err(AuthErrorKind::AccountDisabled);
    }

    Ok(AuthenticatedUser { claims, user })
}

/// Extractor for endpoints that require authentication.
/// Fails the request with a JSON 401 when no valid credential is presented.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state)
            .await
            .map(Auth)
            .map_err(ApiAuthError::from)
    }
}

/// Optional authentication extractor - never fails, returns
/// `Option<AuthenticatedUser>`. For endpoints where anonymous access is
/// permitted and the handler decides what anonymous callers may do.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(authenticate_request(parts, state).await.ok()))
    }
}
