//! Tests for the dual-token authentication system.
//!
//! Tests cover:
//! - Transport precedence (Authorization header vs access_token cookie)
//! - Token refresh flow with and without rotation
//! - Blacklisting on logout and rotation, including replay attempts
//! - Cookie lifecycle around login/refresh/logout

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use stockdesk::db::Role;
use tower::ServiceExt;

// =============================================================================
// Transport precedence
// =============================================================================

#[tokio::test]
async fn test_invalid_header_fails_even_with_valid_cookie() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (access, refresh) = login(&app, "alice", "correct-password").await;

    // A present Authorization header commits; the valid cookie must not rescue it
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/profile")
                .header("authorization", "Bearer garbage-token")
                .header("cookie", auth_cookies(&access, &refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_cookie_rejected() {
    let (app, _db) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/profile")
                .header("cookie", "access_token=garbage-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_not_accepted_as_access_token() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (_access, refresh) = login(&app, "alice", "correct-password").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/profile")
                .header("cookie", format!("access_token={}", refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_without_cookie_returns_401() {
    let (app, _db) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No refresh token found");
}

#[tokio::test]
async fn test_refresh_with_garbage_cookie_returns_401() {
    let (app, _db) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", "refresh_token=garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid refresh token");
}

#[tokio::test]
async fn test_refresh_issues_working_access_token() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (_access, refresh) = login(&app, "alice", "correct-password").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", refresh_cookie_only(&refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = extract_set_cookies(&response);
    let new_access = set_cookie_value(&cookies, "access_token").expect("new access cookie");

    // Without rotation the refresh cookie is left untouched
    assert!(set_cookie_value(&cookies, "refresh_token").is_none());

    let json = body_json(response).await;
    assert_eq!(json["message"], "Token refreshed successfully");

    // The new access token resolves back to alice
    let profile = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/profile")
                .header("cookie", format!("access_token={}", new_access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(profile.status(), StatusCode::OK);
    assert_eq!(body_json(profile).await["username"], "alice");
}

#[tokio::test]
async fn test_refresh_token_reusable_without_rotation() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (_access, refresh) = login(&app, "alice", "correct-password").await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/token/refresh")
                    .header("cookie", refresh_cookie_only(&refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_refresh_for_deactivated_user_rejected() {
    let (app, db) = create_test_app().await;
    let id = seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (_access, refresh) = login(&app, "alice", "correct-password").await;

    db.users().set_active(id, false).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", refresh_cookie_only(&refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Rotation
// =============================================================================

#[tokio::test]
async fn test_rotation_issues_new_refresh_token_and_blocks_replay() {
    let (app, db) = create_test_app_with_rotation().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (_access, refresh) = login(&app, "alice", "correct-password").await;

    // First refresh succeeds and rotates
    let first = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", refresh_cookie_only(&refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let cookies = extract_set_cookies(&first);
    let rotated = set_cookie_value(&cookies, "refresh_token").expect("rotated refresh cookie");
    assert_ne!(rotated, refresh);

    // Replaying the original refresh token fails: its JTI is blacklisted
    let replay = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", refresh_cookie_only(&refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(replay).await["error"], "Invalid refresh token");

    // The rotated token still works
    let second = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", refresh_cookie_only(&rotated))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_clears_cookies_and_blacklists_refresh_token() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (access, refresh) = login(&app, "alice", "correct-password").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header("cookie", auth_cookies(&access, &refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = extract_set_cookies(&response);
    assert!(has_cleared_cookie(&cookies, "access_token"));
    assert!(has_cleared_cookie(&cookies, "refresh_token"));

    let json = body_json(response).await;
    assert_eq!(json["message"], "Successfully logged out");

    // The refresh token is dead even though it is otherwise unexpired
    let replay = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", refresh_cookie_only(&refresh))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_requires_credential() {
    let (app, _db) = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_refresh_cookie_still_succeeds() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (access, _refresh) = login(&app, "alice", "correct-password").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header("cookie", format!("access_token={}", access))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = extract_set_cookies(&response);
    assert!(has_cleared_cookie(&cookies, "access_token"));
    assert!(has_cleared_cookie(&cookies, "refresh_token"));
}

#[tokio::test]
async fn test_logout_with_undecodable_refresh_cookie_still_succeeds() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (access, _refresh) = login(&app, "alice", "correct-password").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(
                    "cookie",
                    format!("access_token={}; refresh_token=garbage", access),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_twice_is_idempotent() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;
    let (access, refresh) = login(&app, "alice", "correct-password").await;

    for _ in 0..2 {
        // The access token is still cryptographically valid, so the second
        // logout authenticates fine and re-revokes the same JTI
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header("cookie", auth_cookies(&access, &refresh))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// =============================================================================
// Multiple sessions
// =============================================================================

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let (app, db) = create_test_app().await;
    seed_user(&db, "alice", "alice@example.com", "correct-password", Role::Employee).await;

    let (access1, refresh1) = login(&app, "alice", "correct-password").await;
    let (_access2, refresh2) = login(&app, "alice", "correct-password").await;

    // Logging out session 1 must not kill session 2's refresh token
    let logout = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header("cookie", auth_cookies(&access1, &refresh1))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::OK);

    let refresh = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/token/refresh")
                .header("cookie", refresh_cookie_only(&refresh2))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(refresh.status(), StatusCode::OK);
}
