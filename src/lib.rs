// SPDX-License-Identifier: MIT

//! Coachlink: backend API connecting athletic coaches and athletes.
//!
//! This crate provides profile management, lesson content, messaging,
//! video-submission review, invitation onboarding, and subscription billing
//! on top of Firestore and third-party SaaS (payments, email, AI assist).

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AssistClient, EmailClient, StripeClient, VisibilityService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub visibility: VisibilityService,
    pub stripe: StripeClient,
    pub email: EmailClient,
    pub assist: AssistClient,
}
