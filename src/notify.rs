//! Push notification dispatch.
//!
//! The OS-level notification scheduler of the mobile app becomes a thin
//! client for an Expo-compatible push gateway. The service only composes
//! `{title, body}` descriptors; delivery, coalescing, and display are the
//! gateway's concern. An owner without a push token degrades to a log line
//! so the engines stay exercisable without a registered device.

use serde::Serialize;

use crate::db::DbProfile;

/// A composed notification, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
}

/// Client for the push gateway send endpoint.
pub struct Notifier {
    client: reqwest::Client,
    base_url: String,
}

impl Notifier {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send a notification to a device token.
    pub async fn send_push(
        &self,
        token: &str,
        message: &NotificationMessage,
    ) -> Result<(), String> {
        let url = format!("{}/--/api/v2/push/send", self.base_url);
        let request = PushRequest {
            to: token,
            title: &message.title,
            body: &message.body,
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Push request failed: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("Push gateway error {}: {}", status, text));
        }

        Ok(())
    }

    /// Deliver a notification to an owner's registered device.
    ///
    /// Missing profile or token is not an error: reminders are best-effort
    /// and must never fail the calling job.
    pub async fn deliver(&self, owner: &str, profile: Option<&DbProfile>, message: &NotificationMessage) {
        let token = profile.map(|p| p.push_token.as_str()).unwrap_or("");
        if token.is_empty() {
            log::info!(
                "No push token for owner {}; notification '{}' logged only",
                owner,
                message.title
            );
            return;
        }

        if let Err(e) = self.send_push(token, message).await {
            log::warn!("Failed to deliver '{}' to {}: {}", message.title, owner, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let notifier = Notifier::new("https://exp.host/");
        assert_eq!(notifier.base_url, "https://exp.host");
    }

    #[test]
    fn test_push_request_shape() {
        let request = PushRequest {
            to: "ExponentPushToken[abc]",
            title: "Today's tasks",
            body: "• Meeting (09:00)",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], "ExponentPushToken[abc]");
        assert_eq!(json["title"], "Today's tasks");
        assert_eq!(json["body"], "• Meeting (09:00)");
    }
}
