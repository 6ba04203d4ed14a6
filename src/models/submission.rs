// SPDX-License-Identifier: MIT

//! Video submission model and review lifecycle.

use serde::{Deserialize, Serialize};

/// Submission lifecycle status.
///
/// Legal transitions are strictly forward:
/// pending -> claimed -> reviewed -> complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Uploaded by the athlete, waiting for a coach to claim it
    #[default]
    Pending,
    /// Claimed by a coach; locked to that coach
    Claimed,
    /// Review written, athlete notified
    Reviewed,
    /// Athlete acknowledged the review
    Complete,
}

impl SubmissionStatus {
    /// Whether moving to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (SubmissionStatus::Pending, SubmissionStatus::Claimed)
                | (SubmissionStatus::Claimed, SubmissionStatus::Reviewed)
                | (SubmissionStatus::Reviewed, SubmissionStatus::Complete)
        )
    }
}

/// Coach-authored review attached to a reviewed submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Overall feedback
    pub summary: String,
    /// Suggested drills or focus points
    pub drills: Vec<String>,
    /// When the review was written (RFC3339)
    pub reviewed_at: String,
}

/// Submission document stored in `submissions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Opaque submission ID (also used as document ID)
    pub submission_id: String,
    /// Owning athlete
    pub athlete_id: String,
    /// Claiming coach, set on claim
    pub coach_id: Option<String>,
    /// Uploaded video URL (object store)
    pub video_url: String,
    /// Athlete's note to the coach
    pub note: String,
    pub status: SubmissionStatus,
    /// Review payload, set when status reaches `Reviewed`
    pub review: Option<Review>,
    /// When the submission was created (RFC3339)
    pub created_at: String,
    /// When the submission was claimed (RFC3339)
    pub claimed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_moves_strictly_forward() {
        use SubmissionStatus::*;
        assert!(Pending.can_transition_to(Claimed));
        assert!(Claimed.can_transition_to(Reviewed));
        assert!(Reviewed.can_transition_to(Complete));
    }

    #[test]
    fn no_skipping_or_backtracking() {
        use SubmissionStatus::*;
        assert!(!Pending.can_transition_to(Reviewed));
        assert!(!Pending.can_transition_to(Complete));
        assert!(!Claimed.can_transition_to(Pending));
        assert!(!Reviewed.can_transition_to(Claimed));
        assert!(!Complete.can_transition_to(Pending));
    }

    #[test]
    fn no_self_transitions() {
        use SubmissionStatus::*;
        for status in [Pending, Claimed, Reviewed, Complete] {
            assert!(!status.can_transition_to(status));
        }
    }
}
