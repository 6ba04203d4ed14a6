//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Canonical coach profiles
    pub const COACH_PROFILES: &str = "coach_profiles";
    /// Denormalized public directory (written by the visibility sync)
    pub const COACH_LISTING: &str = "coach_listing";
    pub const INVITATIONS: &str = "invitations";
    pub const SUBMISSIONS: &str = "submissions";
    pub const LESSONS: &str = "lessons";
    pub const CONVERSATIONS: &str = "conversations";
    pub const MESSAGES: &str = "messages";
    /// Stripe subscription mirror (keyed by user_id)
    pub const SUBSCRIPTIONS: &str = "subscriptions";
}
