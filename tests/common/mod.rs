#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use stockdesk::{
    ServerConfig,
    auth::hash_password,
    create_app,
    db::{Database, NewUser, Role},
};
use tower::ServiceExt;

/// Create a test app backed by an in-memory database.
/// Returns (app, db) so tests can seed and inspect data directly.
pub async fn create_test_app() -> (Router, Database) {
    create_test_app_with_options(false).await
}

/// Create a test app with refresh token rotation enabled.
pub async fn create_test_app_with_rotation() -> (Router, Database) {
    create_test_app_with_options(true).await
}

async fn create_test_app_with_options(rotate_refresh_tokens: bool) -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: b"test-jwt-secret-for-testing".to_vec(),
        secure_cookies: false, // Tests run on localhost HTTP
        rotate_refresh_tokens,
    };
    (create_app(&config), db)
}

/// Insert a user directly into the database with a hashed password.
/// Returns the user id.
pub async fn seed_user(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> i64 {
    db.users()
        .create(&NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).expect("Failed to hash password"),
            first_name: String::new(),
            last_name: String::new(),
            role,
        })
        .await
        .expect("Failed to seed user")
}

/// Build a JSON request.
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
}

/// Extract Set-Cookie headers from a response.
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Get the value of a freshly set (non-cleared) cookie.
pub fn set_cookie_value(cookies: &[String], name: &str) -> Option<String> {
    cookies
        .iter()
        .filter(|c| !c.contains("Max-Age=0"))
        .find_map(|c| {
            let (key, rest) = c.split_once('=')?;
            if key != name {
                return None;
            }
            Some(rest.split(';').next().unwrap_or("").to_string())
        })
}

/// Check if cookies contain a token being cleared (Max-Age=0).
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    cookies
        .iter()
        .any(|c| c.starts_with(&format!("{}=", cookie_name)) && c.contains("Max-Age=0"))
}

/// Log in through the API and return the (access, refresh) cookie values.
pub async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            serde_json::json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        axum::http::StatusCode::OK,
        "Login failed for {}",
        username
    );

    let cookies = extract_set_cookies(&response);
    let access = set_cookie_value(&cookies, "access_token").expect("No access_token cookie set");
    let refresh = set_cookie_value(&cookies, "refresh_token").expect("No refresh_token cookie set");
    (access, refresh)
}

/// Format a Cookie header carrying both tokens.
pub fn auth_cookies(access_token: &str, refresh_token: &str) -> String {
    format!(
        "access_token={}; refresh_token={}",
        access_token, refresh_token
    )
}

/// Format a Cookie header carrying only the refresh token.
pub fn refresh_cookie_only(refresh_token: &str) -> String {
    format!("refresh_token={}", refresh_token)
}
