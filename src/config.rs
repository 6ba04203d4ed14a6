//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory. In production the
//! deployment platform injects secrets as environment variables.

use std::env;

/// Default lifetime of an invitation link, in days.
pub const INVITE_TTL_DAYS: i64 = 14;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL for CORS and links in emails
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Stripe price ID for the coaching subscription
    pub stripe_price_id: String,
    /// Sender address for transactional email
    pub email_from: String,

    // --- Secrets (injected as env vars by the platform) ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Stripe secret API key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Transactional email provider API key
    pub email_api_key: String,
    /// AI assist provider API key (optional; assist endpoint 502s without it)
    pub assist_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            stripe_price_id: env::var("STRIPE_PRICE_ID")
                .map_err(|_| ConfigError::Missing("STRIPE_PRICE_ID"))?,
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Coachlink <noreply@coachlink.app>".to_string()),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_SECRET_KEY"))?,
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?,
            email_api_key: env::var("EMAIL_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("EMAIL_API_KEY"))?,
            assist_api_key: env::var("ASSIST_API_KEY")
                .ok()
                .map(|v| v.trim().to_string()),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            stripe_price_id: "price_test".to_string(),
            email_from: "Coachlink <test@coachlink.test>".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            stripe_secret_key: "sk_test_secret".to_string(),
            stripe_webhook_secret: "whsec_test".to_string(),
            email_api_key: "re_test".to_string(),
            assist_api_key: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("STRIPE_SECRET_KEY", "sk_test_123");
        env::set_var("STRIPE_WEBHOOK_SECRET", "whsec_123");
        env::set_var("STRIPE_PRICE_ID", "price_123");
        env::set_var("EMAIL_API_KEY", "re_123");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.stripe_secret_key, "sk_test_123");
        assert_eq!(config.stripe_price_id, "price_123");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_default_config_has_no_assist_key() {
        let config = Config::test_default();
        assert!(config.assist_api_key.is_none());
    }
}
