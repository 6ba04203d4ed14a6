//! Lesson content model.

use serde::{Deserialize, Serialize};

/// Publish status of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Coach-authored lesson stored in `lessons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Opaque lesson ID (also used as document ID)
    pub lesson_id: String,
    /// Authoring coach
    pub coach_id: String,
    pub title: String,
    /// Lesson body (markdown)
    pub body: String,
    /// Attached media URLs (object store)
    pub media_urls: Vec<String>,
    pub status: PublishStatus,
    /// When the lesson was created (RFC3339)
    pub created_at: String,
    /// Last edit timestamp (RFC3339)
    pub updated_at: String,
}
