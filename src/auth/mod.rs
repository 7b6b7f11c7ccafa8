//! JWT authentication with dual transport.
//!
//! Dual-token system: short-lived access tokens (1 hour, stateless) and
//! long-lived refresh tokens (7 days, revocable through a JTI blacklist).
//! Tokens are accepted from an Authorization bearer header or from HttpOnly
//! cookies; the header wins and never falls back to cookies.

mod cookie;
mod credentials;
mod errors;
mod extractors;
mod password;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, access_cookie, clear_cookie, get_cookie,
    refresh_cookie,
};
pub use credentials::{CredentialError, validate_credentials};
pub use errors::ApiAuthError;
pub use extractors::{Auth, OptionalAuth};
pub use password::{hash_password, verify_password};
pub use state::HasAuthState;
pub use types::AuthenticatedUser;
