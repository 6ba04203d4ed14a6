// SPDX-License-Identifier: MIT

//! Public "Browse Coaches" directory routes.
//!
//! Served from the denormalized `coach_listing` collection (via the
//! in-process cache), never from canonical profiles.

use crate::error::{AppError, Result};
use crate::models::ListingEntry;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/coaches", get(browse_coaches))
        .route("/coaches/{slug}", get(coach_by_slug))
}

/// Directory card for the public listing.
#[derive(Serialize)]
pub struct CoachCard {
    pub slug: String,
    pub display_name: String,
    pub headline: String,
    pub specialties: Vec<String>,
    pub photo_url: Option<String>,
    pub rate_cents: Option<u32>,
}

impl From<ListingEntry> for CoachCard {
    fn from(entry: ListingEntry) -> Self {
        Self {
            slug: entry.slug,
            display_name: entry.display_name,
            headline: entry.headline,
            specialties: entry.specialties,
            photo_url: entry.photo_url,
            rate_cents: entry.rate_cents,
        }
    }
}

#[derive(Serialize)]
pub struct DirectoryResponse {
    pub coaches: Vec<CoachCard>,
    pub total: u32,
}

/// List visible coaches.
async fn browse_coaches(State(state): State<Arc<AppState>>) -> Result<Json<DirectoryResponse>> {
    let entries = state.visibility.directory(&state.db).await?;

    let coaches: Vec<CoachCard> = entries.into_iter().map(CoachCard::from).collect();
    let total = coaches.len() as u32;

    Ok(Json(DirectoryResponse { coaches, total }))
}

/// Get a single visible coach by slug.
async fn coach_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CoachCard>> {
    let entry = state
        .db
        .get_listing_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Coach '{}' not found", slug)))?;

    Ok(Json(CoachCard::from(entry)))
}
