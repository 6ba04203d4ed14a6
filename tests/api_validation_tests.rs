// SPDX-License-Identifier: MIT

//! Request validation and role enforcement tests.
//!
//! All checks here run before any database access, so the offline mock
//! suffices: a 400 or 403 proves the guard fired first.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use coachlink::middleware::auth::create_jwt;
use coachlink::models::Role;
use serde_json::json;
use tower::ServiceExt;

mod common;

fn bearer(role: Role, key: &[u8]) -> String {
    let token = create_jwt("user-1", role, key).unwrap();
    format!("Bearer {}", token)
}

#[tokio::test]
async fn test_profile_update_rejects_invalid_slug() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/coach/profile")
                .header(header::AUTHORIZATION, bearer(Role::Coach, &state.config.jwt_signing_key))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"slug": "Not A Slug!"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_update_rejects_overlong_headline() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/coach/profile")
                .header(header::AUTHORIZATION, bearer(Role::Coach, &state.config.jwt_signing_key))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"headline": "x".repeat(200)}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_update_requires_coach_role() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/coach/profile")
                .header(
                    header::AUTHORIZATION,
                    bearer(Role::Athlete, &state.config.jwt_signing_key),
                )
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"bio": "hello"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invitation_issue_requires_coach_role() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/invitations")
                .header(
                    header::AUTHORIZATION,
                    bearer(Role::Athlete, &state.config.jwt_signing_key),
                )
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_coach_cannot_issue_coach_invitation() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/invitations")
                .header(header::AUTHORIZATION, bearer(Role::Coach, &state.config.jwt_signing_key))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"role": "coach"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Granting a non-athlete role requires admin
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_submission_create_requires_athlete_role() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/submissions")
                .header(header::AUTHORIZATION, bearer(Role::Coach, &state.config.jwt_signing_key))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"video_url": "https://cdn.example.com/v/1.mp4"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    // Coaches review submissions, they don't file them
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invitation_rejects_invalid_email() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/invitations")
                .header(header::AUTHORIZATION, bearer(Role::Coach, &state.config.jwt_signing_key))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"email": "not-an-email"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
