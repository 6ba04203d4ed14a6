// SPDX-License-Identifier: MIT

//! Lesson content routes.
//!
//! Coaches author and publish lessons; athletes read the published lessons
//! of their assigned coach.

use crate::error::{AppError, Result};
use crate::ids::new_doc_id;
use crate::middleware::auth::AuthUser;
use crate::models::{Lesson, PublishStatus, Role};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/lessons", post(create_lesson))
        .route("/api/lessons", get(list_lessons))
        .route("/api/lessons/{id}", put(update_lesson))
        .route("/api/lessons/{id}", delete(delete_lesson))
        .route("/api/lessons/{id}/publish", post(publish_lesson))
}

#[derive(Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 100_000))]
    pub body: String,
    #[validate(length(max = 20))]
    pub media_urls: Option<Vec<String>>,
}

/// Coach creates a draft lesson.
async fn create_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateLessonRequest>,
) -> Result<Json<Lesson>> {
    user.require_role(Role::Coach)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let now = now_rfc3339();
    let lesson = Lesson {
        lesson_id: new_doc_id(),
        coach_id: user.user_id.clone(),
        title: req.title,
        body: req.body,
        media_urls: req.media_urls.unwrap_or_default(),
        status: PublishStatus::Draft,
        created_at: now.clone(),
        updated_at: now,
    };

    state.db.set_lesson(&lesson).await?;

    tracing::info!(lesson_id = %lesson.lesson_id, coach_id = %user.user_id, "Lesson created");

    Ok(Json(lesson))
}

#[derive(Serialize)]
pub struct LessonsResponse {
    pub lessons: Vec<Lesson>,
    pub total: u32,
}

/// Role-scoped listing: coaches see all their lessons; athletes see the
/// published lessons of their assigned coach.
async fn list_lessons(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LessonsResponse>> {
    let lessons = if user.role >= Role::Coach {
        state.db.list_lessons_for_coach(&user.user_id).await?
    } else {
        let user_doc = state
            .db
            .get_user(&user.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

        match user_doc.coach_id {
            Some(coach_id) => state.db.list_published_lessons(&coach_id).await?,
            None => vec![],
        }
    };

    let total = lessons.len() as u32;
    Ok(Json(LessonsResponse { lessons, total }))
}

#[derive(Deserialize, Validate)]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 100_000))]
    pub body: Option<String>,
    #[validate(length(max = 20))]
    pub media_urls: Option<Vec<String>>,
}

/// Load a lesson and verify the caller authored it.
async fn owned_lesson(state: &AppState, user: &AuthUser, lesson_id: &str) -> Result<Lesson> {
    let lesson = state
        .db
        .get_lesson(lesson_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", lesson_id)))?;

    if lesson.coach_id != user.user_id && !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only the authoring coach can modify this lesson".to_string(),
        ));
    }

    Ok(lesson)
}

/// Update a lesson's content.
async fn update_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLessonRequest>,
) -> Result<Json<Lesson>> {
    user.require_role(Role::Coach)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut lesson = owned_lesson(&state, &user, &id).await?;

    if let Some(v) = req.title {
        lesson.title = v;
    }
    if let Some(v) = req.body {
        lesson.body = v;
    }
    if let Some(v) = req.media_urls {
        lesson.media_urls = v;
    }
    lesson.updated_at = now_rfc3339();

    state.db.set_lesson(&lesson).await?;

    Ok(Json(lesson))
}

#[derive(Deserialize)]
pub struct PublishRequest {
    /// Target status; defaults to published
    pub status: Option<PublishStatus>,
}

/// Publish (or archive) a lesson.
async fn publish_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<Lesson>> {
    user.require_role(Role::Coach)?;

    let mut lesson = owned_lesson(&state, &user, &id).await?;
    lesson.status = req.status.unwrap_or(PublishStatus::Published);
    lesson.updated_at = now_rfc3339();

    state.db.set_lesson(&lesson).await?;

    tracing::info!(lesson_id = %id, status = ?lesson.status, "Lesson status changed");

    Ok(Json(lesson))
}

#[derive(Serialize)]
pub struct DeleteLessonResponse {
    pub deleted: bool,
}

/// Delete a lesson.
async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteLessonResponse>> {
    user.require_role(Role::Coach)?;

    // Ownership check before the delete
    owned_lesson(&state, &user, &id).await?;
    state.db.delete_lesson(&id).await?;

    tracing::info!(lesson_id = %id, "Lesson deleted");

    Ok(Json(DeleteLessonResponse { deleted: true }))
}
