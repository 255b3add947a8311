//! Gemini image generation over the REST API.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

use super::{GenerationOptions, ImageGenerator};

/// Base URL of the `generateContent` endpoint.
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// API key from the argument, else `GEMINI_API_KEY`, else `GOOGLE_API_KEY`.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| {
            API_KEY_VARS
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|k| !k.trim().is_empty())
        })
        .ok_or(Error::MissingApiKey)
}

/// Blocking Gemini client.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    /// Create a client with an API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("doc2post/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: GEMINI_ENDPOINT.to_string(),
        })
    }

    /// Create a client from an explicit key or the environment.
    pub fn from_env(explicit: Option<&str>) -> Result<Self> {
        Self::new(resolve_api_key(explicit)?)
    }

    /// Point the client at another endpoint base.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            model
        )
    }
}

/// Request body for a single prompt.
fn request_body(prompt: &str, options: &GenerationOptions) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "imageConfig": {
                "aspectRatio": options.aspect_ratio,
                "imageSize": options.resolution,
            },
        },
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[allow(dead_code)]
    mime_type: Option<String>,
    data: String,
}

/// Decoded bytes of the first inline image in a response.
fn image_from_response(body: &str) -> Result<Vec<u8>> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let inline = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().find_map(|p| p.inline_data))
        .ok_or_else(|| Error::Other("No image data in API response".to_string()))?;

    STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| Error::Encoding(format!("invalid base64 image data: {}", e)))
}

impl ImageGenerator for GeminiClient {
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        let response = self
            .http
            .post(self.url(&options.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(prompt, options))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let snippet: String = body.chars().take(300).collect();
            return Err(Error::Http(format!("HTTP {}: {}", status, snippet)));
        }

        image_from_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let options = GenerationOptions::default().with_aspect_ratio("4:3");
        let body = request_body("A lighthouse", &options);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "A lighthouse");
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
        assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "4:3");
        assert_eq!(body["generationConfig"]["imageConfig"]["imageSize"], "1K");
    }

    #[test]
    fn test_image_from_response() {
        let encoded = STANDARD.encode(b"\x89PNG fake");
        let body = format!(
            r#"{{"candidates":[{{"content":{{"parts":[{{"text":"Here you go"}},{{"inlineData":{{"mimeType":"image/png","data":"{}"}}}}]}}}}]}}"#,
            encoded
        );
        assert_eq!(image_from_response(&body).unwrap(), b"\x89PNG fake".to_vec());
    }

    #[test]
    fn test_response_without_image() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"refused"}]}}]}"#;
        assert!(image_from_response(body).is_err());
        assert!(image_from_response(r#"{}"#).is_err());
    }

    #[test]
    fn test_url() {
        let client = GeminiClient::new("key")
            .unwrap()
            .with_endpoint("http://localhost:9/models/");
        assert_eq!(
            client.url("gemini-3-pro-image-preview"),
            "http://localhost:9/models/gemini-3-pro-image-preview:generateContent"
        );
    }

    #[test]
    fn test_explicit_api_key_wins() {
        assert_eq!(resolve_api_key(Some("abc")).unwrap(), "abc");
    }
}
