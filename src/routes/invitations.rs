// SPDX-License-Identifier: MIT

//! Invitation routes: issuance, validation, revocation, and redemption.
//!
//! The raw token only ever appears in the issued link; storage is keyed by
//! its SHA-256. Redemption runs in a Firestore transaction so a token's last
//! use cannot be double-spent.

use crate::config::INVITE_TTL_DAYS;
use crate::error::{AppError, Result};
use crate::ids::{new_doc_id, new_invite_token, token_hash};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{Invitation, Role, User};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const MAX_INVITE_USES: u32 = 100;

/// Authenticated invitation routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/invitations", post(issue_invitation))
        .route("/api/invitations/{token}", delete(revoke_invitation))
}

/// Public invitation routes (validation and redemption).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/invitations/{token}", get(validate_invitation))
        .route("/invitations/{token}/accept", post(accept_invitation))
}

// ─── Issuance ────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct IssueInvitationRequest {
    /// Invitee email; when set, the invite link is emailed
    #[validate(email)]
    pub email: Option<String>,
    /// Role granted on redemption (admins only; coaches always grant athlete)
    pub role: Option<Role>,
    #[validate(range(min = 1, max = 100))]
    pub max_uses: Option<u32>,
    #[validate(range(min = 1, max = 90))]
    pub expires_in_days: Option<i64>,
}

#[derive(Serialize)]
pub struct IssueInvitationResponse {
    /// The raw token; shown once, never stored
    pub token: String,
    pub invite_url: String,
    pub grants_role: Role,
    pub expires_at: String,
    pub max_uses: u32,
    pub emailed: bool,
}

/// Issue a new invitation.
///
/// Coaches invite athletes onto their roster. Admins may grant any role up
/// to their own.
async fn issue_invitation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<IssueInvitationRequest>,
) -> Result<Json<IssueInvitationResponse>> {
    user.require_role(Role::Coach)?;
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let grants_role = req.role.unwrap_or(Role::Athlete);
    if grants_role != Role::Athlete {
        user.require_role(Role::Admin)?;
    }
    if grants_role > user.role {
        return Err(AppError::Forbidden(
            "Cannot grant a role above your own".to_string(),
        ));
    }

    // Athlete invites from a coach assign the redeemer to that coach
    let coach_id = if grants_role == Role::Athlete && user.role == Role::Coach {
        Some(user.user_id.clone())
    } else {
        None
    };

    let raw_token = new_invite_token();
    let expires_at = format_utc_rfc3339(
        chrono::Utc::now()
            + chrono::Duration::days(req.expires_in_days.unwrap_or(INVITE_TTL_DAYS)),
    );
    let max_uses = req.max_uses.unwrap_or(1).min(MAX_INVITE_USES);

    let invitation = Invitation {
        token_hash: token_hash(&raw_token),
        issued_by: user.user_id.clone(),
        grants_role,
        coach_id,
        email: req.email.clone(),
        expires_at: expires_at.clone(),
        max_uses,
        use_count: 0,
        revoked: false,
        created_at: now_rfc3339(),
    };

    state.db.upsert_invitation(&invitation).await?;

    let invite_url = format!("{}/invite/{}", state.config.frontend_url, raw_token);

    // Email delivery is best-effort; the issuer still gets the link back
    let mut emailed = false;
    if let Some(invitee) = &req.email {
        let inviter_name = state
            .db
            .get_user(&user.user_id)
            .await?
            .map(|u| u.display_name)
            .unwrap_or_else(|| "A coach".to_string());

        match state
            .email
            .send_invitation(invitee, &inviter_name, &invite_url)
            .await
        {
            Ok(()) => emailed = true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to email invitation; link returned to issuer");
            }
        }
    }

    tracing::info!(
        issued_by = %user.user_id,
        grants_role = grants_role.as_str(),
        max_uses,
        emailed,
        "Invitation issued"
    );

    Ok(Json(IssueInvitationResponse {
        token: raw_token,
        invite_url,
        grants_role,
        expires_at,
        max_uses,
        emailed,
    }))
}

// ─── Revocation ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

/// Revoke an invitation (issuer or admin).
async fn revoke_invitation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(token): Path<String>,
) -> Result<Json<RevokeResponse>> {
    let hash = token_hash(&token);
    let mut invitation = state
        .db
        .get_invitation(&hash)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    if invitation.issued_by != user.user_id && !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only the issuer or an admin can revoke an invitation".to_string(),
        ));
    }

    invitation.revoked = true;
    state.db.upsert_invitation(&invitation).await?;

    tracing::info!(revoked_by = %user.user_id, "Invitation revoked");

    Ok(Json(RevokeResponse { revoked: true }))
}

// ─── Validation (public) ─────────────────────────────────────

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub grants_role: Option<Role>,
    pub expires_at: Option<String>,
    /// Display name of the inviting coach, when the invite assigns one
    pub coach_name: Option<String>,
}

/// Check a token without side effects (the onboarding page calls this).
async fn validate_invitation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ValidateResponse>> {
    let invitation = state.db.get_invitation(&token_hash(&token)).await?;

    let invitation = match invitation {
        Some(i) if i.can_redeem(chrono::Utc::now()) => i,
        // Unknown and dead tokens answer identically
        _ => {
            return Ok(Json(ValidateResponse {
                valid: false,
                grants_role: None,
                expires_at: None,
                coach_name: None,
            }))
        }
    };

    let coach_name = match &invitation.coach_id {
        Some(coach_id) => state
            .db
            .get_user(coach_id)
            .await?
            .map(|u| u.display_name),
        None => None,
    };

    Ok(Json(ValidateResponse {
        valid: true,
        grants_role: Some(invitation.grants_role),
        expires_at: Some(invitation.expires_at),
        coach_name,
    }))
}

// ─── Redemption (public) ─────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 80))]
    pub display_name: String,
}

#[derive(Serialize)]
pub struct AcceptInvitationResponse {
    /// Session JWT for the onboarded user
    pub session_token: String,
    pub user_id: String,
    pub role: Role,
    pub coach_id: Option<String>,
}

/// Redeem an invitation: create or upgrade the user and mint a session.
async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<AcceptInvitationRequest>,
) -> Result<Json<AcceptInvitationResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let hash = token_hash(&token);
    let invitation = state
        .db
        .get_invitation(&hash)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

    if !invitation.can_redeem(chrono::Utc::now()) {
        return Err(AppError::BadRequest(
            "Invitation is expired, revoked, or fully used".to_string(),
        ));
    }

    // Email-bound invitations only redeem for that address
    if let Some(bound) = &invitation.email {
        if !bound.eq_ignore_ascii_case(&req.email) {
            return Err(AppError::Forbidden(
                "Invitation was issued to a different email address".to_string(),
            ));
        }
    }

    let now = now_rfc3339();
    let user = match state.db.get_user_by_email(&req.email).await? {
        Some(mut existing) => {
            // Upgrade role if the invite grants a higher one; never downgrade
            if invitation.grants_role > existing.role {
                existing.role = invitation.grants_role;
            }
            if invitation.coach_id.is_some() {
                existing.coach_id = invitation.coach_id.clone();
            }
            existing.last_active = now.clone();
            existing
        }
        None => User {
            user_id: new_doc_id(),
            email: req.email.clone(),
            display_name: req.display_name.clone(),
            role: invitation.grants_role,
            coach_id: invitation.coach_id.clone(),
            invited_by: Some(hash.clone()),
            created_at: now.clone(),
            last_active: now,
        },
    };

    // Use-count increment and user write commit together
    let invitation = state.db.redeem_invitation_atomic(&hash, &user).await?;

    let session_token = create_jwt(&user.user_id, user.role, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(
        user_id = %user.user_id,
        role = user.role.as_str(),
        issued_by = %invitation.issued_by,
        "Invitation accepted"
    );

    Ok(Json(AcceptInvitationResponse {
        session_token,
        user_id: user.user_id,
        role: user.role,
        coach_id: user.coach_id,
    }))
}
