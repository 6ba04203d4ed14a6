// SPDX-License-Identifier: MIT

//! Subscription billing routes (Stripe).
//!
//! Checkout creates a hosted Stripe session; the local `subscriptions`
//! document is a mirror kept current by signature-verified webhook events.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Subscription;
use crate::services::StripeEvent;
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Authenticated billing routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/billing/checkout", post(create_checkout))
        .route("/api/billing/subscription", get(get_subscription))
}

/// Public webhook route (signature-verified, not JWT-authenticated).
pub fn webhook_routes() -> Router<Arc<AppState>> {
    Router::new().route("/billing/webhook", post(handle_webhook))
}

// ─── Checkout ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CheckoutResponse {
    /// Hosted Stripe Checkout URL to redirect the user to
    pub checkout_url: String,
}

/// Create a subscription-mode Checkout session for the current user.
async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CheckoutResponse>> {
    let user_doc = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    // Reuse the existing Stripe customer, or create one on first checkout
    let subscription = state.db.get_subscription(&user.user_id).await?;
    let customer_id = match &subscription {
        Some(s) => s.stripe_customer_id.clone(),
        None => {
            let customer_id = state
                .stripe
                .create_customer(&user_doc.email, &user.user_id)
                .await?;

            let mirror = Subscription {
                user_id: user.user_id.clone(),
                stripe_customer_id: customer_id.clone(),
                stripe_subscription_id: None,
                status: "incomplete".to_string(),
                current_period_end: None,
                updated_at: now_rfc3339(),
            };
            state.db.set_subscription(&mirror).await?;
            customer_id
        }
    };

    let success_url = format!("{}/billing/success", state.config.frontend_url);
    let cancel_url = format!("{}/billing/cancel", state.config.frontend_url);

    let session = state
        .stripe
        .create_checkout_session(
            &customer_id,
            &state.config.stripe_price_id,
            &success_url,
            &cancel_url,
        )
        .await?;

    tracing::info!(
        user_id = %user.user_id,
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        checkout_url: session.url,
    }))
}

// ─── Subscription Status ─────────────────────────────────────

#[derive(Serialize)]
pub struct SubscriptionResponse {
    pub status: String,
    pub active: bool,
    pub current_period_end: Option<String>,
}

/// Get the current user's subscription state (from the mirror).
async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SubscriptionResponse>> {
    let subscription = state.db.get_subscription(&user.user_id).await?;

    let response = match subscription {
        Some(s) => SubscriptionResponse {
            active: s.is_active(),
            status: s.status,
            current_period_end: s.current_period_end,
        },
        None => SubscriptionResponse {
            status: "none".to_string(),
            active: false,
            current_period_end: None,
        },
    };

    Ok(Json(response))
}

// ─── Webhook ─────────────────────────────────────────────────

/// Handle incoming Stripe webhook events (POST).
///
/// The body must be the raw bytes: the signature covers the exact payload.
async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = match headers.get("Stripe-Signature").and_then(|h| h.to_str().ok()) {
        Some(s) => s,
        None => {
            tracing::warn!("Webhook missing Stripe-Signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(e) = state.stripe.verify_signature(&body, signature, now) {
        tracing::warn!(error = %e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event = match state.stripe.parse_event(&body) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse webhook event");
            // Still 200 so Stripe does not retry an unparseable payload
            return StatusCode::OK;
        }
    };

    match apply_event(&state, event).await {
        Ok(()) => StatusCode::OK,
        Err(AppError::NotFound(msg)) => {
            // No mirror for this customer; retrying will never help
            tracing::warn!(detail = %msg, "Webhook event for unknown customer, acked");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to apply webhook event");
            // Non-2xx makes Stripe retry, which is what we want for DB failures
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Apply a parsed event to the subscription mirror.
async fn apply_event(state: &AppState, event: StripeEvent) -> Result<()> {
    match event {
        StripeEvent::CheckoutCompleted {
            customer_id,
            subscription_id,
        } => {
            let mut mirror = mirror_for_customer(state, &customer_id).await?;
            mirror.stripe_subscription_id = subscription_id;
            mirror.status = "active".to_string();
            mirror.updated_at = now_rfc3339();
            state.db.set_subscription(&mirror).await?;

            tracing::info!(user_id = %mirror.user_id, "Checkout completed");
        }
        StripeEvent::SubscriptionUpdated {
            customer_id,
            subscription_id,
            status,
            current_period_end,
        } => {
            let mut mirror = mirror_for_customer(state, &customer_id).await?;
            mirror.stripe_subscription_id = Some(subscription_id);
            mirror.status = status;
            mirror.current_period_end = current_period_end
                .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                .map(format_utc_rfc3339);
            mirror.updated_at = now_rfc3339();
            state.db.set_subscription(&mirror).await?;

            tracing::info!(
                user_id = %mirror.user_id,
                status = %mirror.status,
                "Subscription updated"
            );
        }
        StripeEvent::SubscriptionDeleted { customer_id, .. } => {
            let mut mirror = mirror_for_customer(state, &customer_id).await?;
            mirror.status = "canceled".to_string();
            mirror.updated_at = now_rfc3339();
            state.db.set_subscription(&mirror).await?;

            tracing::info!(user_id = %mirror.user_id, "Subscription canceled");
        }
        StripeEvent::Ignored(event_type) => {
            tracing::debug!(event_type = %event_type, "Ignoring unhandled event type");
        }
    }

    Ok(())
}

async fn mirror_for_customer(state: &AppState, customer_id: &str) -> Result<Subscription> {
    state
        .db
        .get_subscription_by_customer(customer_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No subscription mirror for customer {}",
                customer_id
            ))
        })
}
