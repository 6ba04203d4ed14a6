// SPDX-License-Identifier: MIT

//! Profile routes: the current user and the canonical coach profile.
//!
//! Every successful coach profile write triggers the visibility fan-out.
//! The fan-out is best-effort; the profile write is the source of truth.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CoachProfile, CoachStatus, Role};
use crate::services::assist::ProfileSuggestion;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/coach/profile", get(get_coach_profile))
        .route("/api/coach/profile", put(update_coach_profile))
        .route("/api/coach/profile/assist", post(assist_profile))
}

// ─── Current User ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub coach_id: Option<String>,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user_doc = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse {
        user_id: user_doc.user_id,
        email: user_doc.email,
        display_name: user_doc.display_name,
        role: user_doc.role,
        coach_id: user_doc.coach_id,
    }))
}

// ─── Coach Profile ───────────────────────────────────────────

/// Partial profile update; only provided fields change.
#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 80))]
    pub display_name: Option<String>,
    #[validate(length(min = 3, max = 60))]
    pub slug: Option<String>,
    #[validate(length(max = 120))]
    pub headline: Option<String>,
    #[validate(length(max = 5000))]
    pub bio: Option<String>,
    #[validate(length(max = 10))]
    pub specialties: Option<Vec<String>>,
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(url)]
    pub intro_video_url: Option<String>,
    #[validate(range(min = 0, max = 10_000_000))]
    pub rate_cents: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: CoachProfile,
    /// Derived completeness (directory card requirements)
    pub profile_complete: bool,
    /// Whether the coach currently satisfies the visibility predicate
    pub visible: bool,
}

impl From<CoachProfile> for ProfileResponse {
    fn from(profile: CoachProfile) -> Self {
        let profile_complete = profile.is_complete();
        let visible = profile.is_visible();
        Self {
            profile,
            profile_complete,
            visible,
        }
    }
}

/// Get the caller's canonical coach profile.
async fn get_coach_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    user.require_role(Role::Coach)?;

    let profile = state
        .db
        .get_coach_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Coach profile not created yet".to_string()))?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Merge-update the caller's coach profile, then fan out to the listing.
async fn update_coach_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    user.require_role(Role::Coach)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if let Some(slug) = &req.slug {
        validate_slug(slug)?;
        if state.db.slug_in_use(slug, &user.user_id).await? {
            return Err(AppError::BadRequest(format!(
                "Slug '{}' is already taken",
                slug
            )));
        }
    }

    let now = now_rfc3339();

    // Merge into the existing profile, or start a fresh pending one
    let mut profile = match state.db.get_coach_profile(&user.user_id).await? {
        Some(p) => p,
        None => {
            let user_doc = state
                .db
                .get_user(&user.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
            CoachProfile {
                coach_id: user.user_id.clone(),
                display_name: user_doc.display_name,
                slug: String::new(),
                headline: String::new(),
                bio: String::new(),
                specialties: vec![],
                photo_url: None,
                intro_video_url: None,
                rate_cents: None,
                is_active: true,
                status: CoachStatus::Pending,
                created_at: now.clone(),
                updated_at: now.clone(),
            }
        }
    };

    if let Some(v) = req.display_name {
        profile.display_name = v;
    }
    if let Some(v) = req.slug {
        profile.slug = v;
    }
    if let Some(v) = req.headline {
        profile.headline = v;
    }
    if let Some(v) = req.bio {
        profile.bio = v;
    }
    if let Some(v) = req.specialties {
        profile.specialties = v
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Some(v) = req.photo_url {
        profile.photo_url = Some(v);
    }
    if let Some(v) = req.intro_video_url {
        profile.intro_video_url = Some(v);
    }
    if let Some(v) = req.rate_cents {
        profile.rate_cents = Some(v);
    }
    if let Some(v) = req.is_active {
        profile.is_active = v;
    }
    profile.updated_at = now;

    state.db.upsert_coach_profile(&profile).await?;

    // Best-effort fan-out; a failure here leaves the listing stale and is
    // recovered by the admin fix scan
    state.visibility.sync_best_effort(&state.db, &profile).await;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Slug format: lowercase alphanumerics and hyphens, no leading/trailing
/// hyphen.
fn validate_slug(slug: &str) -> Result<()> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');

    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Slug must be lowercase letters, digits, and hyphens".to_string(),
        ))
    }
}

// ─── AI Assist ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AssistRequest {
    /// Bio to draft from; defaults to the stored profile bio
    #[validate(length(max = 5000))]
    pub bio: Option<String>,
}

/// Draft a headline and specialties from the coach's bio.
async fn assist_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AssistRequest>,
) -> Result<Json<ProfileSuggestion>> {
    user.require_role(Role::Coach)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let bio = match req.bio {
        Some(bio) if !bio.trim().is_empty() => bio,
        _ => {
            let profile = state
                .db
                .get_coach_profile(&user.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Coach profile not created yet".to_string()))?;
            if profile.bio.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "Write a bio first, or provide one in the request".to_string(),
                ));
            }
            profile.bio
        }
    };

    let suggestion = state.assist.suggest_profile(&bio).await?;

    tracing::info!(coach_id = %user.user_id, "Profile suggestion drafted");

    Ok(Json(suggestion))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation_accepts_kebab_case() {
        assert!(validate_slug("sam-rivera").is_ok());
        assert!(validate_slug("coach42").is_ok());
    }

    #[test]
    fn slug_validation_rejects_bad_shapes() {
        assert!(validate_slug("Sam-Rivera").is_err());
        assert!(validate_slug("sam rivera").is_err());
        assert!(validate_slug("-sam").is_err());
        assert!(validate_slug("sam-").is_err());
        assert!(validate_slug("sam_rivera").is_err());
    }
}
