// SPDX-License-Identifier: MIT

//! Messaging routes: coach/athlete conversations.
//!
//! Conversations are restricted to linked pairs: an athlete may only message
//! their assigned coach, and a coach their assigned athletes. Admins may
//! message anyone.

use crate::error::{AppError, Result};
use crate::ids::new_doc_id;
use crate::middleware::auth::AuthUser;
use crate::models::{Conversation, Message, Role};
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

const PREVIEW_MAX_CHARS: usize = 120;
const DEFAULT_MESSAGE_LIMIT: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations", post(start_conversation))
        .route("/api/conversations/{id}/messages", get(list_messages))
        .route("/api/conversations/{id}/messages", post(send_message))
}

// ─── Conversations ───────────────────────────────────────────

#[derive(Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<Conversation>,
    pub total: u32,
}

/// List the caller's conversations, most recently active first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ConversationsResponse>> {
    let conversations = state.db.list_conversations_for_user(&user.user_id).await?;
    let total = conversations.len() as u32;
    Ok(Json(ConversationsResponse {
        conversations,
        total,
    }))
}

#[derive(Deserialize, Validate)]
pub struct StartConversationRequest {
    #[validate(length(min = 1))]
    pub participant_id: String,
    /// Optional first message
    #[validate(length(min = 1, max = 5000))]
    pub body: Option<String>,
}

/// Start (or return) the conversation with another user.
async fn start_conversation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<StartConversationRequest>,
) -> Result<Json<Conversation>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if req.participant_id == user.user_id {
        return Err(AppError::BadRequest(
            "Cannot start a conversation with yourself".to_string(),
        ));
    }

    check_messaging_allowed(&state, &user, &req.participant_id).await?;

    let conversation_id = Conversation::id_for(&user.user_id, &req.participant_id);
    let now = now_rfc3339();

    let mut conversation = match state.db.get_conversation(&conversation_id).await? {
        Some(existing) => existing,
        None => {
            let mut participants = vec![user.user_id.clone(), req.participant_id.clone()];
            participants.sort();
            Conversation {
                conversation_id: conversation_id.clone(),
                participant_ids: participants,
                last_message_preview: String::new(),
                updated_at: now.clone(),
            }
        }
    };

    if let Some(body) = req.body {
        let message = Message {
            message_id: new_doc_id(),
            conversation_id: conversation_id.clone(),
            sender_id: user.user_id.clone(),
            body: body.clone(),
            sent_at: now.clone(),
        };
        state.db.set_message(&message).await?;

        conversation.last_message_preview = preview(&body);
        conversation.updated_at = now;
    }

    state.db.upsert_conversation(&conversation).await?;

    Ok(Json(conversation))
}

// ─── Messages ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
    pub total: u32,
}

/// List messages in a conversation the caller belongs to, oldest first.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<MessagesResponse>> {
    let conversation = owned_conversation(&state, &user, &id).await?;

    let messages = state
        .db
        .list_messages(&conversation.conversation_id, DEFAULT_MESSAGE_LIMIT)
        .await?;
    let total = messages.len() as u32;

    Ok(Json(MessagesResponse { messages, total }))
}

#[derive(Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
}

/// Send a message in an existing conversation.
async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut conversation = owned_conversation(&state, &user, &id).await?;

    let now = now_rfc3339();
    let message = Message {
        message_id: new_doc_id(),
        conversation_id: conversation.conversation_id.clone(),
        sender_id: user.user_id.clone(),
        body: req.body.clone(),
        sent_at: now.clone(),
    };

    state.db.set_message(&message).await?;

    // Inbox preview update is best-effort denormalization
    conversation.last_message_preview = preview(&req.body);
    conversation.updated_at = now;
    if let Err(e) = state.db.upsert_conversation(&conversation).await {
        tracing::warn!(error = %e, "Failed to update conversation preview");
    }

    Ok(Json(message))
}

// ─── Helpers ─────────────────────────────────────────────────

/// Load a conversation and verify the caller participates in it.
async fn owned_conversation(
    state: &AppState,
    user: &AuthUser,
    conversation_id: &str,
) -> Result<Conversation> {
    let conversation = state
        .db
        .get_conversation(conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;

    if !conversation.involves(&user.user_id) && !user.role.is_admin() {
        return Err(AppError::Forbidden(
            "Not a participant in this conversation".to_string(),
        ));
    }

    Ok(conversation)
}

/// Messaging is limited to linked coach/athlete pairs (admins excepted).
async fn check_messaging_allowed(
    state: &AppState,
    user: &AuthUser,
    other_id: &str,
) -> Result<()> {
    if user.role.is_admin() {
        return Ok(());
    }

    let other = state
        .db
        .get_user(other_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", other_id)))?;

    let linked = match user.role {
        Role::Athlete => {
            let me = state
                .db
                .get_user(&user.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
            me.coach_id.as_deref() == Some(other_id)
        }
        Role::Coach => other.coach_id.as_deref() == Some(user.user_id.as_str()),
        _ => true,
    };

    if linked {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only message your assigned coach or athletes".to_string(),
        ))
    }
}

fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_messages() {
        let long = "x".repeat(500);
        assert_eq!(preview(&long).chars().count(), PREVIEW_MAX_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let multibyte = "é".repeat(200);
        let p = preview(&multibyte);
        assert_eq!(p.chars().count(), PREVIEW_MAX_CHARS);
    }
}
