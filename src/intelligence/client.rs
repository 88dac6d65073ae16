//! Chat-completion client (OpenAI-compatible shape).
//!
//! Requests carry `{model, messages: [{role, content}]}` and the reply is
//! read from `choices[0].message.content`. The provider seam is a trait so
//! tests can substitute a scripted provider for the live endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::AiConfig;

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Seam for the completion endpoint.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run a completion and return the reply text, trimmed.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, String>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenRouter-style completion endpoint.
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(config: &AiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Whether an API key is configured. Without one every completion fails
    /// fast and the calling flow uses its fallback string.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, String> {
        if !self.is_configured() {
            return Err("Completion API key not configured".to_string());
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Completion request failed: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("Completion endpoint error {}: {}", status, text));
        }

        let body: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| format!("Bad completion body: {}", e))?;

        let reply = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if reply.is_empty() {
            return Err("Completion reply was empty".to_string());
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape_matches_endpoint_contract() {
        let messages = vec![
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("hello"),
        ];
        let request = CompletionRequest {
            model: "mistralai/mistral-7b-instruct:free",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "mistralai/mistral-7b-instruct:free");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_content_extraction() {
        let body: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  hi there  "}}]}"#,
        )
        .unwrap();
        let reply = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        assert_eq!(reply, "hi there");
    }

    #[test]
    fn test_empty_choices_yield_empty_reply() {
        let body: CompletionResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.choices.is_empty());
    }

    #[test]
    fn test_unconfigured_client_is_reported() {
        let client = CompletionClient::new(&AiConfig::default());
        assert!(!client.is_configured());
    }
}
