// SPDX-License-Identifier: MIT

//! Coachlink API Server
//!
//! Backend for a coaching marketplace: public coach directory, invitation
//! onboarding, lesson content, video submission review, messaging, and
//! subscription billing.

use coachlink::{
    config::Config,
    db::FirestoreDb,
    services::{AssistClient, EmailClient, StripeClient, VisibilityService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Coachlink API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let visibility = VisibilityService::new();

    let stripe = StripeClient::new(
        config.stripe_secret_key.clone(),
        config.stripe_webhook_secret.clone(),
    );

    let email = EmailClient::new(config.email_api_key.clone(), config.email_from.clone());

    let assist = AssistClient::new(config.assist_api_key.clone());
    if config.assist_api_key.is_none() {
        tracing::warn!("ASSIST_API_KEY not set, profile assist endpoint disabled");
    }

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        visibility,
        stripe,
        email,
        assist,
    });

    // Build router
    let app = coachlink::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coachlink=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
