//! Authentication error types.

use axum::response::{IntoResponse, Response};

/// Internal auth error kind used by the core authentication logic.
#[derive(Debug)]
pub enum AuthErrorKind {
    /// No credential was supplied at all
    MissingCredential,
    /// A credential was supplied but failed validation
    InvalidToken,
    /// The token validated but its subject no longer exists
    UserNotFound,
    /// The token validated but the account is disabled
    AccountDisabled,
    DatabaseError,
}

/// Request authentication error (returns JSON).
#[derive(Debug)]
pub struct ApiAuthError(pub(super) AuthErrorKind);

impl ApiAuthError {
    fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self.0 {
            AuthErrorKind::MissingCredential
            | AuthErrorKind::InvalidToken
            | AuthErrorKind::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthErrorKind::AccountDisabled => StatusCode::FORBIDDEN,
            AuthErrorKind::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.0 {
            AuthErrorKind::MissingCredential => "Authentication credentials were not provided",
            AuthErrorKind::InvalidToken => "Invalid or expired token",
            AuthErrorKind::UserNotFound => "User not found",
            AuthErrorKind::AccountDisabled => "User account is disabled",
            AuthErrorKind::DatabaseError => "Database error",
        }
    }
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self(kind)
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        use axum::Json;
        use serde::Serialize;

        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
