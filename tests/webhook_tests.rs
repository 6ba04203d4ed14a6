// SPDX-License-Identifier: MIT

//! Integration tests for Stripe webhook handling.
//!
//! Signatures are computed with the test webhook secret from
//! `Config::test_default()`, so verification runs for real end to end.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

mod common;

/// Compute a Stripe-Signature header value for a payload.
fn sign_payload(payload: &str, secret: &str, timestamp: i64) -> String {
    let signed = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(signed.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={},v1={}", timestamp, signature)
}

fn now_ts() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

#[tokio::test]
async fn test_webhook_missing_signature_rejected() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/billing/webhook")
                .header("content-type", "application/json")
                .body(Body::from(json!({"type": "invoice.paid"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_bad_signature_rejected() {
    let (app, _) = common::create_test_app();

    let payload = json!({"type": "invoice.paid", "data": {"object": {}}}).to_string();
    let header = sign_payload(&payload, "whsec_wrong_secret", now_ts());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/billing/webhook")
                .header("content-type", "application/json")
                .header("Stripe-Signature", header)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_stale_timestamp_rejected() {
    let (app, state) = common::create_test_app();

    let payload = json!({"type": "invoice.paid", "data": {"object": {}}}).to_string();
    // An hour old, well past the replay tolerance
    let header = sign_payload(
        &payload,
        &state.config.stripe_webhook_secret,
        now_ts() - 3600,
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/billing/webhook")
                .header("content-type", "application/json")
                .header("Stripe-Signature", header)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_ignored_event_returns_ok() {
    let (app, state) = common::create_test_app();

    // A valid signature on an event type we don't handle: 200 with no DB work
    let payload = json!({"type": "invoice.paid", "data": {"object": {}}}).to_string();
    let header = sign_payload(&payload, &state.config.stripe_webhook_secret, now_ts());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/billing/webhook")
                .header("content-type", "application/json")
                .header("Stripe-Signature", header)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_handled_event_retries_on_db_failure() {
    let (app, state) = common::create_test_app();

    let payload = json!({
        "type": "customer.subscription.updated",
        "data": {"object": {
            "id": "sub_1",
            "customer": "cus_1",
            "status": "active",
            "current_period_end": 1767225600
        }}
    })
    .to_string();
    let header = sign_payload(&payload, &state.config.stripe_webhook_secret, now_ts());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/billing/webhook")
                .header("content-type", "application/json")
                .header("Stripe-Signature", header)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    // Offline mock DB fails the mirror update; non-2xx makes Stripe retry
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_webhook_unparseable_payload_acked() {
    let (app, state) = common::create_test_app();

    // Valid signature over a body that is not an event envelope
    let payload = "not json at all".to_string();
    let header = sign_payload(&payload, &state.config.stripe_webhook_secret, now_ts());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/billing/webhook")
                .header("Stripe-Signature", header)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    // 200 so Stripe does not retry a payload that will never parse
    assert_eq!(response.status(), StatusCode::OK);
}
