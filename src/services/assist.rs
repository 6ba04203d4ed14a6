// SPDX-License-Identifier: MIT

//! AI assist client: drafts profile copy from a coach's bio.
//!
//! Calls an OpenAI-compatible chat completions endpoint and parses the
//! model's plain-text reply into structured suggestion fields. The model is
//! instructed to answer in a fixed line format; parsing is defensive because
//! models drift from instructions.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

const COMPLETIONS_MODEL: &str = "gpt-4o-mini";
const MAX_SPECIALTIES: usize = 5;

/// AI assist API client.
#[derive(Clone)]
pub struct AssistClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Structured suggestion parsed from the model reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSuggestion {
    pub headline: String,
    pub specialties: Vec<String>,
}

impl AssistClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key,
        }
    }

    /// Draft a headline and specialties from a coach's bio.
    pub async fn suggest_profile(&self, bio: &str) -> Result<ProfileSuggestion, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::AssistApi("Assist API key not configured".to_string()))?;

        let prompt = format!(
            "You write directory copy for athletic coaches. Given the bio below, \
             reply with exactly two lines:\n\
             HEADLINE: <one sentence, at most 90 characters>\n\
             SPECIALTIES: <comma-separated list, at most {} items>\n\n\
             Bio:\n{}",
            MAX_SPECIALTIES, bio
        );

        let body = ChatRequest {
            model: COMPLETIONS_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.4,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::AssistApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AssistApi(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::AssistApi(format!("JSON parse error: {}", e)))?;

        let text = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AppError::AssistApi("Empty completion".to_string()))?;

        parse_suggestion(text)
            .ok_or_else(|| AppError::AssistApi("Unparseable completion".to_string()))
    }
}

/// Parse the fixed two-line reply format.
///
/// Tolerates extra whitespace, reordered lines, and surrounding prose, but
/// requires a non-empty HEADLINE line to succeed.
fn parse_suggestion(text: &str) -> Option<ProfileSuggestion> {
    let mut headline = None;
    let mut specialties = Vec::new();

    for line in text.lines() {
        let line = line.trim().trim_start_matches(['-', '*', ' ']);
        if let Some(rest) = strip_prefix_ci(line, "HEADLINE:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                headline = Some(rest.to_string());
            }
        } else if let Some(rest) = strip_prefix_ci(line, "SPECIALTIES:") {
            specialties = rest
                .split(',')
                .map(|s| s.trim().trim_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .take(MAX_SPECIALTIES)
                .collect();
        }
    }

    headline.map(|headline| ProfileSuggestion {
        headline,
        specialties,
    })
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_reply() {
        let text = "HEADLINE: Sprint mechanics for 400m runners\n\
                    SPECIALTIES: sprints, block starts, Race Strategy";

        let suggestion = parse_suggestion(text).unwrap();
        assert_eq!(suggestion.headline, "Sprint mechanics for 400m runners");
        assert_eq!(
            suggestion.specialties,
            vec!["sprints", "block starts", "race strategy"]
        );
    }

    #[test]
    fn tolerates_surrounding_prose_and_case() {
        let text = "Sure! Here you go:\n\n\
                    headline: Strength coaching for masters athletes\n\
                    Specialties: powerlifting, mobility\n\n\
                    Let me know if you want alternatives.";

        let suggestion = parse_suggestion(text).unwrap();
        assert_eq!(
            suggestion.headline,
            "Strength coaching for masters athletes"
        );
        assert_eq!(suggestion.specialties, vec!["powerlifting", "mobility"]);
    }

    #[test]
    fn caps_specialties_list() {
        let text = "HEADLINE: H\nSPECIALTIES: a, b, c, d, e, f, g";
        let suggestion = parse_suggestion(text).unwrap();
        assert_eq!(suggestion.specialties.len(), MAX_SPECIALTIES);
    }

    #[test]
    fn missing_headline_fails_parse() {
        assert!(parse_suggestion("SPECIALTIES: a, b").is_none());
        assert!(parse_suggestion("HEADLINE:   \nSPECIALTIES: a").is_none());
        assert!(parse_suggestion("complete nonsense").is_none());
    }

    #[tokio::test]
    async fn unconfigured_client_returns_assist_error() {
        let client = AssistClient::new(None);
        let result = client.suggest_profile("bio").await;
        assert!(matches!(result, Err(AppError::AssistApi(_))));
    }
}
