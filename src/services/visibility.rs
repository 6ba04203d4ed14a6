// SPDX-License-Identifier: MIT

//! Coach visibility synchronization.
//!
//! After every canonical profile write, a merged snapshot of the public
//! subset is fanned out into the `coach_listing` collection. The fan-out is
//! best-effort: the canonical write has already committed, so a failed
//! listing write leaves the directory stale until the admin validate-and-fix
//! scan rewrites it. There are no automatic retries.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{CoachProfile, ListingEntry};
use crate::time_utils::now_rfc3339;
use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};

/// How long the in-process directory cache stays fresh.
const DIRECTORY_CACHE_TTL: Duration = Duration::from_secs(60);

const DIRECTORY_CACHE_KEY: &str = "directory";

/// Report from a validate(-and-fix) scan over the listing collection.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncReport {
    /// Canonical profiles examined
    pub checked: u32,
    /// Listing entries missing or diverged from their canonical profile
    pub stale: u32,
    /// Listing entries with no canonical profile behind them
    pub orphaned: u32,
    /// Entries rewritten (fix mode only)
    pub fixed: u32,
    /// Orphaned entries deleted (fix mode only)
    pub removed: u32,
    /// Coach IDs that were stale or orphaned
    pub drifted_coach_ids: Vec<String>,
}

/// Keeps the denormalized public directory consistent with canonical
/// coach profiles.
pub struct VisibilityService {
    directory_cache: DashMap<&'static str, (Instant, Vec<ListingEntry>)>,
}

impl Default for VisibilityService {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityService {
    pub fn new() -> Self {
        Self {
            directory_cache: DashMap::new(),
        }
    }

    /// Write the merged listing snapshot for a coach and invalidate the
    /// directory cache.
    pub async fn sync_coach(
        &self,
        db: &FirestoreDb,
        profile: &CoachProfile,
    ) -> Result<ListingEntry, AppError> {
        let entry = ListingEntry::from_profile(profile, &now_rfc3339());
        db.set_listing_entry(&entry).await?;
        self.invalidate();

        tracing::info!(
            coach_id = %profile.coach_id,
            visible = entry.visible,
            "Coach listing synced"
        );

        Ok(entry)
    }

    /// Sync after a canonical write, swallowing failures.
    ///
    /// The canonical profile has already committed. A fan-out failure leaves
    /// the listing stale, which the admin fix scan recovers.
    pub async fn sync_best_effort(&self, db: &FirestoreDb, profile: &CoachProfile) {
        if let Err(e) = self.sync_coach(db, profile).await {
            tracing::error!(
                coach_id = %profile.coach_id,
                error = %e,
                "Listing fan-out failed; directory is stale until the next fix scan"
            );
        }
    }

    /// Visible directory entries, served from the in-process cache when fresh.
    pub async fn directory(&self, db: &FirestoreDb) -> Result<Vec<ListingEntry>, AppError> {
        if let Some(cached) = self.directory_cache.get(DIRECTORY_CACHE_KEY) {
            let (stored_at, entries) = cached.value();
            if stored_at.elapsed() < DIRECTORY_CACHE_TTL {
                tracing::debug!(count = entries.len(), "Directory cache hit");
                return Ok(entries.clone());
            }
        }

        let entries = db.list_visible_listing().await?;
        self.directory_cache
            .insert(DIRECTORY_CACHE_KEY, (Instant::now(), entries.clone()));
        Ok(entries)
    }

    /// Drop the cached directory (called after every sync).
    pub fn invalidate(&self) {
        self.directory_cache.remove(DIRECTORY_CACHE_KEY);
    }

    /// Scan all canonical profiles against the listing collection.
    ///
    /// In fix mode, stale entries are rewritten from their canonical profile
    /// and orphaned entries are deleted. In validate mode the report only
    /// counts drift.
    pub async fn validate_listing(
        &self,
        db: &FirestoreDb,
        fix: bool,
    ) -> Result<SyncReport, AppError> {
        let profiles = db.list_coach_profiles().await?;
        let entries = db.list_listing_entries().await?;

        let mut report = SyncReport {
            checked: profiles.len() as u32,
            ..SyncReport::default()
        };

        let mut stored: std::collections::HashMap<String, ListingEntry> = entries
            .into_iter()
            .map(|e| (e.coach_id.clone(), e))
            .collect();

        let now = now_rfc3339();
        for profile in &profiles {
            let expected = ListingEntry::from_profile(profile, &now);
            let is_stale = match stored.remove(&profile.coach_id) {
                Some(current) => !current.same_snapshot(&expected),
                None => true,
            };

            if !is_stale {
                continue;
            }

            report.stale += 1;
            report.drifted_coach_ids.push(profile.coach_id.clone());

            if fix {
                db.set_listing_entry(&expected).await?;
                report.fixed += 1;
                tracing::info!(coach_id = %profile.coach_id, "Stale listing entry rewritten");
            }
        }

        // Anything left in `stored` has no canonical profile behind it
        for (coach_id, _) in stored {
            report.orphaned += 1;
            report.drifted_coach_ids.push(coach_id.clone());

            if fix {
                db.delete_listing_entry(&coach_id).await?;
                report.removed += 1;
                tracing::info!(coach_id = %coach_id, "Orphaned listing entry removed");
            }
        }

        if fix {
            self.invalidate();
        }

        tracing::info!(
            checked = report.checked,
            stale = report.stale,
            orphaned = report.orphaned,
            fixed = report.fixed,
            removed = report.removed,
            "Listing scan complete"
        );

        Ok(report)
    }
}
