//! Authentication user types.

use crate::db::User;
use crate::jwt::AccessClaims;

/// Authenticated user information resolved from a validated token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// JWT claims from the access token
    pub claims: AccessClaims,
    /// The resolved database user record
    pub user: User,
}
