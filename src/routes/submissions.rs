// SPDX-License-Identifier: MIT

//! Video submission routes: the review lifecycle.
//!
//! pending -> claimed -> reviewed -> complete. Claiming is transactional
//! (first coach wins); the remaining transitions are guarded by ownership
//! checks plus the status machine.

use crate::error::{AppError, Result};
use crate::ids::new_doc_id;
use crate::middleware::auth::AuthUser;
use crate::models::{Review, Role, Submission, SubmissionStatus};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/submissions", post(create_submission))
        .route("/api/submissions", get(list_submissions))
        .route("/api/submissions/{id}/claim", post(claim_submission))
        .route("/api/submissions/{id}/review", post(review_submission))
        .route("/api/submissions/{id}/complete", post(complete_submission))
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    #[validate(url)]
    pub video_url: String,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

/// Athlete uploads a video for review.
async fn create_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<Json<Submission>> {
    // Submissions belong to athletes; coaches and admins review, they
    // don't file.
    if user.role != Role::Athlete {
        return Err(AppError::Forbidden(
            "Only athletes can submit videos for review".to_string(),
        ));
    }

    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let submission = Submission {
        submission_id: new_doc_id(),
        athlete_id: user.user_id.clone(),
        coach_id: None,
        video_url: req.video_url,
        note: req.note.unwrap_or_default(),
        status: SubmissionStatus::Pending,
        review: None,
        created_at: now_rfc3339(),
        claimed_at: None,
    };

    state.db.set_submission(&submission).await?;

    tracing::info!(
        submission_id = %submission.submission_id,
        athlete_id = %user.user_id,
        "Submission created"
    );

    Ok(Json(submission))
}

// ─── List ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SubmissionsResponse {
    pub submissions: Vec<Submission>,
    pub total: u32,
}

/// Role-scoped listing: athletes see their own submissions; coaches see the
/// pending queue plus submissions they have claimed.
async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SubmissionsResponse>> {
    let submissions = if user.role >= Role::Coach {
        let mut pending = state.db.list_pending_submissions().await?;
        let claimed = state.db.list_submissions_for_coach(&user.user_id).await?;
        pending.extend(claimed);
        pending
    } else {
        state.db.list_submissions_for_athlete(&user.user_id).await?
    };

    let total = submissions.len() as u32;
    Ok(Json(SubmissionsResponse { submissions, total }))
}

// ─── Claim ───────────────────────────────────────────────────

/// Coach claims a pending submission (first coach wins).
async fn claim_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Submission>> {
    user.require_role(Role::Coach)?;

    let submission = state.db.claim_submission_atomic(&id, &user.user_id).await?;

    Ok(Json(submission))
}

// ─── Review ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1, max = 10_000))]
    pub summary: String,
    #[validate(length(max = 20))]
    pub drills: Option<Vec<String>>,
}

/// Claiming coach writes the review; the athlete is notified by email.
async fn review_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Submission>> {
    user.require_role(Role::Coach)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut submission = state
        .db
        .get_submission(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))?;

    if submission.coach_id.as_deref() != Some(user.user_id.as_str()) {
        return Err(AppError::Forbidden(
            "Only the claiming coach can review this submission".to_string(),
        ));
    }

    if !submission
        .status
        .can_transition_to(SubmissionStatus::Reviewed)
    {
        return Err(AppError::BadRequest(format!(
            "Submission cannot be reviewed from status {:?}",
            submission.status
        )));
    }

    let now = now_rfc3339();
    submission.review = Some(Review {
        summary: req.summary,
        drills: req.drills.unwrap_or_default(),
        reviewed_at: now.clone(),
    });
    submission.status = SubmissionStatus::Reviewed;

    state.db.set_submission(&submission).await?;

    // Notification is best-effort; the review is already stored
    if let Some(athlete) = state.db.get_user(&submission.athlete_id).await? {
        let coach_name = state
            .db
            .get_user(&user.user_id)
            .await?
            .map(|u| u.display_name)
            .unwrap_or_else(|| "Your coach".to_string());
        let submission_url = format!(
            "{}/submissions/{}",
            state.config.frontend_url, submission.submission_id
        );

        if let Err(e) = state
            .email
            .send_review_ready(&athlete.email, &coach_name, &submission_url)
            .await
        {
            tracing::warn!(error = %e, "Failed to send review notification");
        }
    }

    tracing::info!(
        submission_id = %id,
        coach_id = %user.user_id,
        "Submission reviewed"
    );

    Ok(Json(submission))
}

// ─── Complete ────────────────────────────────────────────────

/// Owning athlete acknowledges the review.
async fn complete_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Submission>> {
    let mut submission = state
        .db
        .get_submission(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))?;

    if submission.athlete_id != user.user_id {
        return Err(AppError::Forbidden(
            "Only the owning athlete can complete this submission".to_string(),
        ));
    }

    if !submission
        .status
        .can_transition_to(SubmissionStatus::Complete)
    {
        return Err(AppError::BadRequest(format!(
            "Submission cannot be completed from status {:?}",
            submission.status
        )));
    }

    submission.status = SubmissionStatus::Complete;
    state.db.set_submission(&submission).await?;

    Ok(Json(submission))
}
