// SPDX-License-Identifier: MIT

//! Invitation model for onboarding links.
//!
//! Invitations are stored keyed by the SHA-256 of the raw token, so a
//! database leak does not leak live invite links. The raw token only exists
//! in the issued URL.

use crate::models::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Invitation document stored in `invitations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// SHA-256 hex of the raw token (also used as document ID)
    pub token_hash: String,
    /// User ID of the issuer
    pub issued_by: String,
    /// Role granted on redemption
    pub grants_role: Role,
    /// Coach the redeemer is assigned to (set when a coach invites athletes)
    pub coach_id: Option<String>,
    /// Invitee email, if the invite was sent by email
    pub email: Option<String>,
    /// Expiry (RFC3339)
    pub expires_at: String,
    /// Maximum redemptions
    pub max_uses: u32,
    /// Redemptions so far
    pub use_count: u32,
    /// Revoked by the issuer or an admin
    pub revoked: bool,
    /// When the invitation was created (RFC3339)
    pub created_at: String,
}

impl Invitation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires) => now >= expires.with_timezone(&Utc),
            // Unparseable expiry is treated as expired rather than eternal
            Err(_) => true,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.use_count >= self.max_uses
    }

    /// The single redemption predicate: not revoked, not expired, not used up.
    pub fn can_redeem(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now) && !self.is_exhausted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation(expires_at: &str, max_uses: u32, use_count: u32) -> Invitation {
        Invitation {
            token_hash: "abc123".to_string(),
            issued_by: "coach-1".to_string(),
            grants_role: Role::Athlete,
            coach_id: Some("coach-1".to_string()),
            email: None,
            expires_at: expires_at.to_string(),
            max_uses,
            use_count,
            revoked: false,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn redeemable_before_expiry() {
        let invite = invitation("2026-02-01T00:00:00Z", 1, 0);
        assert!(invite.can_redeem(at("2026-01-15T00:00:00Z")));
    }

    #[test]
    fn expired_invitation_cannot_redeem() {
        let invite = invitation("2026-02-01T00:00:00Z", 1, 0);
        assert!(invite.is_expired(at("2026-02-01T00:00:00Z")));
        assert!(!invite.can_redeem(at("2026-02-02T00:00:00Z")));
    }

    #[test]
    fn exhausted_invitation_cannot_redeem() {
        let invite = invitation("2026-02-01T00:00:00Z", 3, 3);
        assert!(invite.is_exhausted());
        assert!(!invite.can_redeem(at("2026-01-15T00:00:00Z")));
    }

    #[test]
    fn revoked_invitation_cannot_redeem() {
        let mut invite = invitation("2026-02-01T00:00:00Z", 1, 0);
        invite.revoked = true;
        assert!(!invite.can_redeem(at("2026-01-15T00:00:00Z")));
    }

    #[test]
    fn garbage_expiry_is_treated_as_expired() {
        let invite = invitation("not-a-date", 1, 0);
        assert!(invite.is_expired(at("2026-01-15T00:00:00Z")));
    }
}
