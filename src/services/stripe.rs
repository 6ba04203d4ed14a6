// SPDX-License-Identifier: MIT

//! Stripe API client for subscription checkout and webhook events.
//!
//! Handles:
//! - Customer creation
//! - Checkout session creation (subscription mode)
//! - Webhook signature verification (HMAC-SHA256, constant-time compare)
//! - Event payload parsing for the subscription mirror

use crate::error::AppError;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a webhook signature timestamp, in seconds.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    webhook_secret: String,
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.stripe.com/v1".to_string(),
            secret_key,
            webhook_secret,
        }
    }

    /// Create a Stripe customer for a user.
    pub async fn create_customer(&self, email: &str, user_id: &str) -> Result<String, AppError> {
        let url = format!("{}/customers", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&[("email", email), ("metadata[user_id]", user_id)])
            .send()
            .await
            .map_err(|e| AppError::PaymentApi(e.to_string()))?;

        let customer: StripeCustomer = self.check_response_json(response).await?;
        Ok(customer.id)
    }

    /// Create a subscription-mode Checkout session; returns the hosted URL.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, AppError> {
        let url = format!("{}/checkout/sessions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&[
                ("mode", "subscription"),
                ("customer", customer_id),
                ("line_items[0][price]", price_id),
                ("line_items[0][quantity]", "1"),
                ("success_url", success_url),
                ("cancel_url", cancel_url),
            ])
            .send()
            .await
            .map_err(|e| AppError::PaymentApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Verify a `Stripe-Signature` header against the raw request body.
    ///
    /// Header format: `t=<unix_ts>,v1=<hex_hmac>[,v1=...]`. The signed
    /// payload is `"{t}.{body}"`. Comparison is constant-time and the
    /// timestamp must be within tolerance of `now`.
    pub fn verify_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
        now_unix: i64,
    ) -> Result<(), AppError> {
        let invalid = || AppError::BadRequest("Invalid webhook signature".to_string());

        let mut timestamp: Option<i64> = None;
        let mut candidates: Vec<String> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => candidates.push(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(invalid)?;
        if candidates.is_empty() {
            return Err(invalid());
        }

        if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            tracing::warn!(timestamp, "Webhook signature timestamp outside tolerance");
            return Err(invalid());
        }

        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        for candidate in &candidates {
            if expected.as_bytes().ct_eq(candidate.as_bytes()).into() {
                return Ok(());
            }
        }

        tracing::warn!("Webhook signature mismatch");
        Err(invalid())
    }

    /// Parse a verified webhook payload into the events we act on.
    pub fn parse_event(&self, payload: &[u8]) -> Result<StripeEvent, AppError> {
        let envelope: EventEnvelope = serde_json::from_slice(payload)
            .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {}", e)))?;

        let object = envelope.data.object;
        let event = match envelope.event_type.as_str() {
            "checkout.session.completed" => StripeEvent::CheckoutCompleted {
                customer_id: object.customer.unwrap_or_default(),
                subscription_id: object.subscription,
            },
            "customer.subscription.updated" | "customer.subscription.created" => {
                StripeEvent::SubscriptionUpdated {
                    customer_id: object.customer.unwrap_or_default(),
                    subscription_id: object.id.unwrap_or_default(),
                    status: object.status.unwrap_or_default(),
                    current_period_end: object.current_period_end,
                }
            }
            "customer.subscription.deleted" => StripeEvent::SubscriptionDeleted {
                customer_id: object.customer.unwrap_or_default(),
                subscription_id: object.id.unwrap_or_default(),
            },
            other => StripeEvent::Ignored(other.to_string()),
        };

        Ok(event)
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PaymentApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::PaymentApi(format!("JSON parse error: {}", e)))
    }
}

/// Webhook events the subscription mirror acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum StripeEvent {
    CheckoutCompleted {
        customer_id: String,
        subscription_id: Option<String>,
    },
    SubscriptionUpdated {
        customer_id: String,
        subscription_id: String,
        status: String,
        current_period_end: Option<i64>,
    },
    SubscriptionDeleted {
        customer_id: String,
        subscription_id: String,
    },
    Ignored(String),
}

/// Checkout session response.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted checkout page URL
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct StripeCustomer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: EventObject,
}

/// Union of the fields we read from checkout.session and subscription
/// objects; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
struct EventObject {
    id: Option<String>,
    customer: Option<String>,
    subscription: Option<String>,
    status: Option<String>,
    current_period_end: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StripeClient {
        StripeClient::new("sk_test".to_string(), "whsec_test".to_string())
    }

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let client = client();
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = 1_767_225_600;
        let header = sign("whsec_test", now, payload);

        assert!(client.verify_signature(payload, &header, now).is_ok());
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let client = client();
        let payload = b"{}";
        let now = 1_767_225_600;
        let header = sign("whsec_other", now, payload);

        assert!(client.verify_signature(payload, &header, now).is_err());
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let client = client();
        let now = 1_767_225_600;
        let header = sign("whsec_test", now, b"{}");

        assert!(client
            .verify_signature(b"{\"evil\":true}", &header, now)
            .is_err());
    }

    #[test]
    fn stale_timestamp_fails_verification() {
        let client = client();
        let payload = b"{}";
        let signed_at = 1_767_225_600;
        let header = sign("whsec_test", signed_at, payload);

        let now = signed_at + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(client.verify_signature(payload, &header, now).is_err());
    }

    #[test]
    fn malformed_header_fails_verification() {
        let client = client();
        assert!(client.verify_signature(b"{}", "garbage", 0).is_err());
        assert!(client.verify_signature(b"{}", "t=notanumber,v1=aa", 0).is_err());
        assert!(client.verify_signature(b"{}", "t=123", 123).is_err());
    }

    #[test]
    fn parses_checkout_completed() {
        let payload = br#"{
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_1", "customer": "cus_1", "subscription": "sub_1"}}
        }"#;

        let event = client().parse_event(payload).unwrap();
        assert_eq!(
            event,
            StripeEvent::CheckoutCompleted {
                customer_id: "cus_1".to_string(),
                subscription_id: Some("sub_1".to_string()),
            }
        );
    }

    #[test]
    fn parses_subscription_updated() {
        let payload = br#"{
            "type": "customer.subscription.updated",
            "data": {"object": {
                "id": "sub_1", "customer": "cus_1",
                "status": "past_due", "current_period_end": 1767225600
            }}
        }"#;

        let event = client().parse_event(payload).unwrap();
        assert_eq!(
            event,
            StripeEvent::SubscriptionUpdated {
                customer_id: "cus_1".to_string(),
                subscription_id: "sub_1".to_string(),
                status: "past_due".to_string(),
                current_period_end: Some(1_767_225_600),
            }
        );
    }

    #[test]
    fn unknown_event_types_are_ignored_not_errors() {
        let payload = br#"{
            "type": "invoice.paid",
            "data": {"object": {"id": "in_1"}}
        }"#;

        let event = client().parse_event(payload).unwrap();
        assert_eq!(event, StripeEvent::Ignored("invoice.paid".to_string()));
    }

    #[test]
    fn invalid_json_is_bad_request() {
        assert!(matches!(
            client().parse_event(b"not json"),
            Err(AppError::BadRequest(_))
        ));
    }
}
