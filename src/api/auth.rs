//! Authentication and user management API endpoints.
//!
//! - POST `/register` - Create a new user account
//! - POST `/login` - Validate credentials, set access + refresh cookies
//! - POST `/logout` - Blacklist the refresh token and clear both cookies
//! - POST `/token/refresh` - Exchange the refresh cookie for new tokens
//! - PATCH `/change-password` - Change the current user's password
//! - GET/PATCH `/profile` - View or update the current user's profile
//! - GET `/permissions` - Role-derived permission summary

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use super::error::{ApiError, FieldErrors, ResultExt, is_valid_email};
use crate::auth::{
    ACCESS_COOKIE_NAME, Auth, CredentialError, REFRESH_COOKIE_NAME, access_cookie, clear_cookie,
    get_cookie, hash_password, refresh_cookie, validate_credentials, verify_password,
};
use crate::db::{Database, NewUser, Role};
use crate::impl_has_auth_state;
use crate::jwt::JwtConfig;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_USERNAME_LENGTH: usize = 150;

/// State for authentication endpoints.
#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
    pub rotate_refresh_tokens: bool,
}

impl_has_auth_state!(AuthState);

pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/token/refresh", post(refresh_token))
        .route("/change-password", patch(change_password))
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/permissions", get(permissions))
        .with_state(state)
}

// --- Validation helpers ---

fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", "This field may not be blank");
        return;
    }
    if username.len() > MAX_USERNAME_LENGTH {
        errors.add("username", "Username is too long");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add(
            "username",
            "Username may contain only letters, digits and @/./+/-/_ characters",
        );
    }
}

fn validate_password_strength(password: &str, field: &str, errors: &mut FieldErrors) {
    if password.len() < MIN_PASSWORD_LENGTH {
        errors.add(field, "Password must be at least 8 characters long");
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "Password cannot be entirely numeric");
    }
}

/// Parse a client-supplied role, defaulting to the least privileged.
fn parse_role(role: Option<&str>, errors: &mut FieldErrors) -> Role {
    match role {
        Some(s) => Role::parse(s).unwrap_or_else(|| {
            errors.add("role", "Role must be one of: admin, manager, employee");
            Role::Employee
        }),
        None => Role::Employee,
    }
}

// --- Register ---

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    role: Option<String>,
}

async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();

    validate_username(&payload.username, &mut errors);

    if !is_valid_email(&payload.email) {
        errors.add("email", "Enter a valid email address");
    }

    validate_password_strength(&payload.password, "password", &mut errors);

    let role = parse_role(payload.role.as_deref(), &mut errors);

    if state
        .db
        .users()
        .username_taken(&payload.username)
        .await
        .db_err("Failed to check username")?
    {
        errors.add("username", "A user with that username already exists");
    }

    if state
        .db
        .users()
        .email_taken(&payload.email, None)
        .await
        .db_err("Failed to check email")?
    {
        errors.add("email", "A user with this email already exists");
    }

    errors.into_result()?;

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to process password")
    })?;

    state
        .db
        .users()
        .create(&NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            role,
        })
        .await
        .db_err("Failed to create user")?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User registered successfully" })),
    ))
}

// --- Login ---

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginUser {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_active: bool,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    token: String,
    user: LoginUser,
}

async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = validate_credentials(&state.db, &payload.username, &payload.password)
        .await
        .map_err(|e| match e {
            CredentialError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            CredentialError::Database(e) => ApiError::db_error("Failed to validate credentials", e),
        })?;

    let access = state
        .jwt
        .generate_access_token(user.id, &user.username, user.role)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            ApiError::internal("Failed to generate token")
        })?;

    let refresh = state
        .jwt
        .generate_refresh_token(user.id, &user.username, user.role)
        .map_err(|e| {
            error!("Failed to generate refresh token: {}", e);
            ApiError::internal("Failed to generate token")
        })?;

    let cookies = AppendHeaders([
        (
            SET_COOKIE,
            access_cookie(&access.token, state.secure_cookies),
        ),
        (
            SET_COOKIE,
            refresh_cookie(&refresh.token, state.secure_cookies),
        ),
    ]);

    Ok((
        StatusCode::OK,
        cookies,
        Json(LoginResponse {
            message: "Login successful",
            token: access.token,
            user: LoginUser {
                id: user.id,
                username: user.username,
                email: user.email,
                first_name: user.first_name,
                last_name: user.last_name,
                is_active: user.is_active,
            },
        }),
    ))
}

// --- Logout ---

/// Logout - blacklist the refresh token and clear both cookies.
///
/// Revocation is best-effort: an undecodable cookie or a blacklist write
/// failure is logged and the logout still succeeds. The cookies are cleared
/// unconditionally either way.
async fn logout(
    State(state): State<AuthState>,
    Auth(_auth): Auth,
    request: Request,
) -> impl IntoResponse {
    if let Some(refresh_token) = get_cookie(request.headers(), REFRESH_COOKIE_NAME) {
        match state.jwt.validate_refresh_token(refresh_token) {
            Ok(claims) => {
                if let Err(e) = state.db.blacklist().revoke(&claims.jti, claims.exp).await {
                    error!("Failed to blacklist refresh token on logout: {}", e);
                }
            }
            Err(e) => warn!("Ignoring undecodable refresh token on logout: {}", e),
        }
    }

    let cookies = AppendHeaders([
        (
            SET_COOKIE,
            clear_cookie(ACCESS_COOKIE_NAME, state.secure_cookies),
        ),
        (
            SET_COOKIE,
            clear_cookie(REFRESH_COOKIE_NAME, state.secure_cookies),
        ),
    ]);

    (
        StatusCode::OK,
        cookies,
        Json(serde_json::json!({ "message": "Successfully logged out" })),
    )
}

// --- Refresh ---

/// Exchange the refresh cookie for a new access token.
///
/// When rotation is enabled the presented refresh token is blacklisted
/// (best-effort) and a fresh refresh token is issued alongside the access
/// token; otherwise the refresh cookie is left untouched.
async fn refresh_token(
    State(state): State<AuthState>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = get_cookie(request.headers(), REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("No refresh token found"))?;

    let claims = state
        .jwt
        .validate_refresh_token(refresh_token)
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;

    if state
        .db
        .blacklist()
        .is_revoked(&claims.jti)
        .await
        .db_err("Failed to check token blacklist")?
    {
        return Err(ApiError::unauthorized("Invalid refresh token"));
    }

    // Resolve the subject so reissued tokens pick up role changes
    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| ApiError::unauthorized("Invalid refresh token"))?;
    let user = state
        .db
        .users()
        .get_by_id(user_id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    if !user.is_active {
        return Err(ApiError::forbidden("User account is disabled"));
    }

    let access = state
        .jwt
        .generate_access_token(user.id, &user.username, user.role)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            ApiError::internal("Failed to generate token")
        })?;

    let mut cookies = vec![(
        SET_COOKIE,
        access_cookie(&access.token, state.secure_cookies),
    )];

    if state.rotate_refresh_tokens {
        // Best-effort: a failed revoke must not block issuing the new pair
        if let Err(e) = state.db.blacklist().revoke(&claims.jti, claims.exp).await {
            error!("Failed to blacklist rotated refresh token: {}", e);
        }

        let refresh = state
            .jwt
            .generate_refresh_token(user.id, &user.username, user.role)
            .map_err(|e| {
                error!("Failed to generate refresh token: {}", e);
                ApiError::internal("Failed to generate token")
            })?;
        cookies.push((
            SET_COOKIE,
            refresh_cookie(&refresh.token, state.secure_cookies),
        ));
    }

    Ok((
        StatusCode::OK,
        AppendHeaders(cookies),
        Json(serde_json::json!({ "message": "Token refreshed successfully" })),
    ))
}

// --- Change password ---

#[derive(Deserialize)]
struct ChangePasswordRequest {
    old_password: String,
    new_password: String,
    confirm_password: String,
}

async fn change_password(
    State(state): State<AuthState>,
    Auth(auth): Auth,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = FieldErrors::new();

    if !verify_password(&payload.old_password, &auth.user.password_hash) {
        errors.add("old_password", "Old password is not correct");
    }

    if payload.new_password != payload.confirm_password {
        errors.add("confirm_password", "New passwords do not match");
    }

    validate_password_strength(&payload.new_password, "new_password", &mut errors);

    errors.into_result()?;

    let password_hash = hash_password(&payload.new_password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to process password")
    })?;

    state
        .db
        .users()
        .update_password(auth.user.id, &password_hash)
        .await
        .db_err("Failed to update password")?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Password changed successfully" })),
    ))
}

// --- Profile ---

#[derive(Serialize)]
struct ProfileResponse {
    id: i64,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    role: Role,
}

async fn get_profile(Auth(auth): Auth) -> Json<ProfileResponse> {
    let user = auth.user;
    Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        role: user.role,
    })
}

#[derive(Deserialize)]
struct UpdateProfileRequest {
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    role: Option<String>,
}

async fn update_profile(
    State(state): State<AuthState>,
    Auth(auth): Auth,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = auth.user;
    let mut errors = FieldErrors::new();

    if let Some(username) = &payload.username {
        if username != &user.username {
            errors.add("username", "Username cannot be changed");
        }
    }

    if let Some(email) = &payload.email {
        if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address");
        } else if state
            .db
            .users()
            .email_taken(email, Some(user.id))
            .await
            .db_err("Failed to check email")?
        {
            errors.add("email", "A user with this email already exists");
        }
    }

    let role = match payload.role.as_deref() {
        Some(s) => Role::parse(s).unwrap_or_else(|| {
            errors.add("role", "Role must be one of: admin, manager, employee");
            user.role
        }),
        None => user.role,
    };

    errors.into_result()?;

    let email = payload.email.unwrap_or(user.email);
    let first_name = payload.first_name.unwrap_or(user.first_name);
    let last_name = payload.last_name.unwrap_or(user.last_name);

    state
        .db
        .users()
        .update_profile(user.id, &email, &first_name, &last_name, role)
        .await
        .db_err("Failed to update profile")?;

    Ok(Json(ProfileResponse {
        id: user.id,
        username: user.username,
        email,
        first_name,
        last_name,
        role,
    }))
}

// --- Permissions ---

#[derive(Serialize)]
struct PermissionsResponse {
    success: bool,
    is_superuser: bool,
    is_staff: bool,
    permissions: &'static [&'static str],
}

async fn permissions(Auth(auth): Auth) -> Json<PermissionsResponse> {
    let role = auth.user.role;
    Json(PermissionsResponse {
        success: true,
        is_superuser: role == Role::Admin,
        is_staff: matches!(role, Role::Admin | Role::Manager),
        permissions: role.permissions(),
    })
}
