//! Client for the translation endpoint (Lingva-compatible).
//!
//! Shape: `GET {base}/api/v1/{source}/{target}/{text}` -> `{"translation": ...}`.
//! Failures yield the empty string; translation is a convenience layer and
//! never blocks the flow that asked for it.

use serde::Deserialize;
use url::Url;

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translation: String,
}

/// Client for the translation endpoint.
pub struct TranslateClient {
    client: reqwest::Client,
    base_url: String,
}

impl TranslateClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Translate `text` between two language codes (e.g. "kk" -> "en").
    ///
    /// Returns the empty string on any failure.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> String {
        match self.request(text, source, target).await {
            Ok(translation) => translation,
            Err(e) => {
                log::warn!("Translation {}->{} failed: {}", source, target, e);
                String::new()
            }
        }
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String, String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| format!("Bad base URL: {}", e))?;
        url.path_segments_mut()
            .map_err(|_| "Base URL cannot hold a path".to_string())?
            .extend(["api", "v1", source, target, text]);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let body: TranslateResponse = resp
            .json()
            .await
            .map_err(|e| format!("Bad response body: {}", e))?;

        Ok(body.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encodes_text() {
        let mut url = Url::parse("https://lingva.ml").unwrap();
        url.path_segments_mut()
            .unwrap()
            .extend(["api", "v1", "kk", "en", "сәлем әлем"]);
        let s = url.to_string();
        assert!(s.starts_with("https://lingva.ml/api/v1/kk/en/"));
        assert!(!s.contains(' '), "text segment must be percent-encoded");
    }

    #[test]
    fn test_response_missing_translation_defaults_empty() {
        let body: TranslateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.translation, "");
    }
}
