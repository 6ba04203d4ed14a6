// SPDX-License-Identifier: MIT

//! Transactional email client (Resend-style JSON API).

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Transactional email client.
#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

impl EmailClient {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.resend.com".to_string(),
            api_key,
            from,
        }
    }

    /// Send an invitation link to an invitee.
    pub async fn send_invitation(
        &self,
        to: &str,
        inviter_name: &str,
        invite_url: &str,
    ) -> Result<(), AppError> {
        let subject = format!("{} invited you to Coachlink", inviter_name);
        let html = format!(
            "<p>{} has invited you to train on Coachlink.</p>\
             <p><a href=\"{}\">Accept your invitation</a></p>\
             <p>This link expires; accept it soon.</p>",
            inviter_name, invite_url
        );
        self.send(to, &subject, &html).await
    }

    /// Notify an athlete that their submission review is ready.
    pub async fn send_review_ready(
        &self,
        to: &str,
        coach_name: &str,
        submission_url: &str,
    ) -> Result<(), AppError> {
        let subject = format!("{} reviewed your video", coach_name);
        let html = format!(
            "<p>{} has finished reviewing your submission.</p>\
             <p><a href=\"{}\">See the feedback</a></p>",
            coach_name, submission_url
        );
        self.send(to, &subject, &html).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), AppError> {
        let url = format!("{}/emails", self.base_url);

        let body = SendRequest {
            from: &self.from,
            to: vec![to],
            subject,
            html,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::EmailApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmailApi(format!("HTTP {}: {}", status, body)));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| AppError::EmailApi(format!("JSON parse error: {}", e)))?;

        tracing::info!(message_id = %sent.id, subject, "Transactional email sent");
        Ok(())
    }
}
