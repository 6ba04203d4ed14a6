//! Subscription state mirrored from Stripe.

use serde::{Deserialize, Serialize};

/// Subscription document stored in `subscriptions`, keyed by user ID.
///
/// This is a mirror of Stripe's state, updated by webhook events. Stripe is
/// the source of truth; this document only exists so the API can answer
/// "is this user subscribed" without a round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// User ID (also used as document ID)
    pub user_id: String,
    /// Stripe customer ID
    pub stripe_customer_id: String,
    /// Stripe subscription ID, set once checkout completes
    pub stripe_subscription_id: Option<String>,
    /// Stripe subscription status ("active", "past_due", "canceled", ...)
    pub status: String,
    /// End of the current billing period (RFC3339)
    pub current_period_end: Option<String>,
    /// Last webhook update (RFC3339)
    pub updated_at: String,
}

impl Subscription {
    /// Whether the subscription currently grants access.
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "active" | "trialing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: &str) -> Subscription {
        Subscription {
            user_id: "user-1".to_string(),
            stripe_customer_id: "cus_123".to_string(),
            stripe_subscription_id: Some("sub_123".to_string()),
            status: status.to_string(),
            current_period_end: None,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn active_and_trialing_grant_access() {
        assert!(subscription("active").is_active());
        assert!(subscription("trialing").is_active());
    }

    #[test]
    fn other_statuses_do_not_grant_access() {
        assert!(!subscription("past_due").is_active());
        assert!(!subscription("canceled").is_active());
        assert!(!subscription("incomplete").is_active());
    }
}
