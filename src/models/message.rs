//! Messaging models: conversations and messages.

use serde::{Deserialize, Serialize};

/// Two-party conversation stored in `conversations`.
///
/// The document ID is derived from the sorted participant pair, so starting
/// a conversation twice lands on the same document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Derived ID: "{lower_user_id}__{higher_user_id}"
    pub conversation_id: String,
    /// Exactly two participants, sorted
    pub participant_ids: Vec<String>,
    /// Preview of the most recent message, for inbox lists
    pub last_message_preview: String,
    /// Timestamp of the most recent message (RFC3339)
    pub updated_at: String,
}

impl Conversation {
    /// Derive the conversation ID for a participant pair.
    pub fn id_for(a: &str, b: &str) -> String {
        if a <= b {
            format!("{}__{}", a, b)
        } else {
            format!("{}__{}", b, a)
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.participant_ids.iter().any(|p| p == user_id)
    }
}

/// Message stored in the flat `messages` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque message ID (also used as document ID)
    pub message_id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    /// When the message was sent (RFC3339)
    pub sent_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_id_is_order_independent() {
        assert_eq!(
            Conversation::id_for("user-b", "user-a"),
            Conversation::id_for("user-a", "user-b")
        );
        assert_eq!(Conversation::id_for("a", "b"), "a__b");
    }

    #[test]
    fn involves_checks_participants() {
        let convo = Conversation {
            conversation_id: "a__b".to_string(),
            participant_ids: vec!["a".to_string(), "b".to_string()],
            last_message_preview: String::new(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        assert!(convo.involves("a"));
        assert!(convo.involves("b"));
        assert!(!convo.involves("c"));
    }
}
