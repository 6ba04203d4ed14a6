// SPDX-License-Identifier: MIT

//! Coach profile models: the canonical document and its denormalized
//! public-directory listing entry.
//!
//! The canonical profile lives in `coach_profiles`. A read-optimized subset
//! is fanned out into `coach_listing` after every edit so the public
//! directory is a single cheap query. The listing is best-effort; the admin
//! validate-and-fix scan is the recovery path when the fan-out write fails.

use serde::{Deserialize, Serialize};

/// Approval status of a coach, set by admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoachStatus {
    /// Awaiting admin review (default for new coaches)
    #[default]
    Pending,
    /// Approved and eligible for the public directory
    Approved,
    /// Suspended by an admin; hidden from the directory
    Suspended,
}

/// Canonical coach profile stored in `coach_profiles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachProfile {
    /// User ID of the coach (also used as document ID)
    pub coach_id: String,
    /// Display name
    pub display_name: String,
    /// URL-safe slug for the public profile page
    pub slug: String,
    /// One-line headline shown on directory cards
    pub headline: String,
    /// Long-form bio
    pub bio: String,
    /// Specialties (e.g. "sprints", "serve mechanics")
    pub specialties: Vec<String>,
    /// Profile photo URL (object store)
    pub photo_url: Option<String>,
    /// Intro video URL (object store)
    pub intro_video_url: Option<String>,
    /// Rate per session in cents
    pub rate_cents: Option<u32>,
    /// Coach-controlled toggle: accepting new athletes
    pub is_active: bool,
    /// Admin-controlled approval status
    pub status: CoachStatus,
    /// When the profile was created (RFC3339)
    pub created_at: String,
    /// Last edit timestamp (RFC3339)
    pub updated_at: String,
}

impl CoachProfile {
    /// A profile is complete once everything a directory card needs is set.
    ///
    /// Derived rather than stored so the flag can never drift from the
    /// fields it summarizes.
    pub fn is_complete(&self) -> bool {
        !self.display_name.trim().is_empty()
            && !self.slug.trim().is_empty()
            && !self.headline.trim().is_empty()
            && !self.bio.trim().is_empty()
            && !self.specialties.is_empty()
            && self.photo_url.is_some()
    }

    /// Whether this coach should appear in the public directory.
    pub fn is_visible(&self) -> bool {
        self.is_active && self.status == CoachStatus::Approved && self.is_complete()
    }
}

/// Denormalized directory entry stored in `coach_listing`.
///
/// A merged snapshot of the public subset of the canonical profile, written
/// by the visibility sync. `visible == false` entries are retained (not
/// deleted) so approval flips are a single write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Coach user ID (also used as document ID)
    pub coach_id: String,
    pub slug: String,
    pub display_name: String,
    pub headline: String,
    pub specialties: Vec<String>,
    pub photo_url: Option<String>,
    pub rate_cents: Option<u32>,
    /// Whether the coach satisfies the visibility predicate
    pub visible: bool,
    /// When this entry was last synced from the canonical profile (RFC3339)
    pub synced_at: String,
}

impl ListingEntry {
    /// Build the expected listing entry from a canonical profile.
    pub fn from_profile(profile: &CoachProfile, synced_at: &str) -> Self {
        Self {
            coach_id: profile.coach_id.clone(),
            slug: profile.slug.clone(),
            display_name: profile.display_name.clone(),
            headline: profile.headline.clone(),
            specialties: profile.specialties.clone(),
            photo_url: profile.photo_url.clone(),
            rate_cents: profile.rate_cents,
            visible: profile.is_visible(),
            synced_at: synced_at.to_string(),
        }
    }

    /// True if `other` carries the same public snapshot (sync timestamp
    /// excluded, since a rewrite always refreshes it).
    pub fn same_snapshot(&self, other: &ListingEntry) -> bool {
        self.coach_id == other.coach_id
            && self.slug == other.slug
            && self.display_name == other.display_name
            && self.headline == other.headline
            && self.specialties == other.specialties
            && self.photo_url == other.photo_url
            && self.rate_cents == other.rate_cents
            && self.visible == other.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> CoachProfile {
        CoachProfile {
            coach_id: "coach-1".to_string(),
            display_name: "Sam Rivera".to_string(),
            slug: "sam-rivera".to_string(),
            headline: "Sprint mechanics for 400m runners".to_string(),
            bio: "Fifteen years coaching collegiate sprinters.".to_string(),
            specialties: vec!["sprints".to_string()],
            photo_url: Some("https://cdn.example.com/sam.jpg".to_string()),
            intro_video_url: None,
            rate_cents: Some(7500),
            is_active: true,
            status: CoachStatus::Approved,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-02T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn complete_approved_active_profile_is_visible() {
        assert!(complete_profile().is_visible());
    }

    #[test]
    fn missing_photo_makes_profile_incomplete() {
        let mut profile = complete_profile();
        profile.photo_url = None;
        assert!(!profile.is_complete());
        assert!(!profile.is_visible());
    }

    #[test]
    fn pending_or_suspended_coach_is_not_visible() {
        let mut profile = complete_profile();
        profile.status = CoachStatus::Pending;
        assert!(!profile.is_visible());
        profile.status = CoachStatus::Suspended;
        assert!(!profile.is_visible());
    }

    #[test]
    fn inactive_coach_is_not_visible() {
        let mut profile = complete_profile();
        profile.is_active = false;
        assert!(!profile.is_visible());
    }

    #[test]
    fn listing_entry_mirrors_visibility() {
        let profile = complete_profile();
        let entry = ListingEntry::from_profile(&profile, "2026-01-03T00:00:00Z");
        assert!(entry.visible);
        assert_eq!(entry.slug, profile.slug);

        let mut hidden = profile.clone();
        hidden.is_active = false;
        let entry = ListingEntry::from_profile(&hidden, "2026-01-03T00:00:00Z");
        assert!(!entry.visible);
    }

    #[test]
    fn same_snapshot_ignores_sync_timestamp() {
        let profile = complete_profile();
        let a = ListingEntry::from_profile(&profile, "2026-01-03T00:00:00Z");
        let b = ListingEntry::from_profile(&profile, "2026-01-04T00:00:00Z");
        assert!(a.same_snapshot(&b));
    }

    #[test]
    fn same_snapshot_detects_drift() {
        let profile = complete_profile();
        let stored = ListingEntry::from_profile(&profile, "2026-01-03T00:00:00Z");

        let mut edited = profile;
        edited.headline = "New headline".to_string();
        let expected = ListingEntry::from_profile(&edited, "2026-01-03T00:00:00Z");

        assert!(!stored.same_snapshot(&expected));
    }
}
