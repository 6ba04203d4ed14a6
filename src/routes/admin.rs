// SPDX-License-Identifier: MIT

//! Admin-only routes: coach approval and listing consistency checks.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CoachStatus, Role};
use crate::services::SyncReport;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/coaches/{coach_id}/status", post(set_coach_status))
        .route("/api/admin/sync/validate", get(validate_sync))
        .route("/api/admin/sync/fix", post(fix_sync))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: CoachStatus,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub coach_id: String,
    pub status: CoachStatus,
    pub visible: bool,
}

/// Approve, suspend, or re-pend a coach. Approval is what makes a
/// complete, active profile appear in the public directory.
async fn set_coach_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(coach_id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<StatusResponse>> {
    user.require_role(Role::Admin)?;

    let mut profile = state
        .db
        .get_coach_profile(&coach_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Coach {} not found", coach_id)))?;

    profile.status = payload.status;
    state.db.upsert_coach_profile(&profile).await?;

    // Status changes must reach the directory, so propagate sync failures
    state.visibility.sync_coach(&state.db, &profile).await?;

    tracing::info!(
        admin = %user.user_id,
        coach_id = %coach_id,
        status = ?profile.status,
        "Coach status updated"
    );

    Ok(Json(StatusResponse {
        coach_id,
        visible: profile.is_visible(),
        status: profile.status,
    }))
}

/// Report listing drift without changing anything.
async fn validate_sync(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SyncReport>> {
    user.require_role(Role::Admin)?;

    let report = state.visibility.validate_listing(&state.db, false).await?;
    Ok(Json(report))
}

/// Repair listing drift: rewrite stale entries, remove orphans.
async fn fix_sync(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SyncReport>> {
    user.require_role(Role::Admin)?;

    let report = state.visibility.validate_listing(&state.db, true).await?;

    tracing::info!(
        admin = %user.user_id,
        fixed = report.fixed,
        removed = report.removed,
        "Listing sync repair completed"
    );

    Ok(Json(report))
}
