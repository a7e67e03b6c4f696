//! Model client boundary and the Gemini REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AiError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// An image sent inline with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// One model call: text parts in order, then inline images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub parts: Vec<String>,
    pub images: Vec<InlineImage>,
    /// Ask the model for `application/json` output.
    pub json_mode: bool,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn text(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    pub fn image(mut self, image: InlineImage) -> Self {
        self.images.push(image);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// A text-generating model. Implementations are stateless per call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, AiError>;
}

/// Client for the Generative Language `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    /// `timeout` bounds each HTTP call so a stalled connection surfaces as a retryable error.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AiError::MissingCredentials(API_KEY_VAR));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Build from `GOOGLE_API_KEY`.
    pub fn from_env(timeout: Duration) -> Result<Self, AiError> {
        let key = std::env::var(API_KEY_VAR).map_err(|_| AiError::MissingCredentials(API_KEY_VAR))?;
        Self::new(key, timeout)
    }

    /// Point the client at another endpoint root (no trailing slash needed).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        debug!(
            model = %request.model,
            parts = request.parts.len(),
            images = request.images.len(),
            "calling model"
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<error body unreadable: {e}>"));
            return Err(AiError::from_status(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        response_text(parsed)
    }
}

fn request_body(request: &GenerateRequest) -> GenerateContentBody<'_> {
    let text_parts = request.parts.iter().map(|text| Part {
        text: Some(text.as_str()),
        inline_data: None,
    });
    let image_parts = request.images.iter().map(|image| Part {
        text: None,
        inline_data: Some(InlineData {
            mime_type: &image.mime_type,
            data: STANDARD.encode(&image.data),
        }),
    });
    GenerateContentBody {
        contents: vec![Content {
            role: "user",
            parts: text_parts.chain(image_parts).collect(),
        }],
        generation_config: request.json_mode.then_some(GenerationConfig {
            response_mime_type: "application/json",
        }),
    }
}

/// Concatenated text of the first candidate.
fn response_text(response: GenerateContentResponse) -> Result<String, AiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_carries_text_images_and_json_mode() {
        let request = GenerateRequest::new("gemini-2.5-flash")
            .text("extract sections")
            .image(InlineImage {
                mime_type: "image/png".into(),
                data: b"png".to_vec(),
            })
            .json();

        let body = serde_json::to_value(request_body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "extract sections"},
                        {"inlineData": {"mimeType": "image/png", "data": "cG5n"}}
                    ]
                }],
                "generationConfig": {"responseMimeType": "application/json"}
            })
        );
    }

    #[test]
    fn plain_text_request_has_no_generation_config() {
        let request = GenerateRequest::new("gemma-3-27b-it").text("map headers");
        let body = serde_json::to_value(request_body(&request)).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "[{\"id\""}, {"text": ": \"1\"}]"}]}}]
        }))
        .unwrap();
        assert_eq!(response_text(response).unwrap(), r#"[{"id": "1"}]"#);
    }

    #[test]
    fn blocked_response_is_empty() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert!(matches!(response_text(response), Err(AiError::EmptyResponse)));

        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(response_text(response), Err(AiError::EmptyResponse)));
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(
            GeminiClient::new("  ", Duration::from_secs(1)),
            Err(AiError::MissingCredentials(_))
        ));
        let client = GeminiClient::new("k", Duration::from_secs(1))
            .unwrap().with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn stalled_server_times_out_as_retryable() {
        // Accepted by the kernel backlog, never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = GeminiClient::new("k", Duration::from_millis(200))
            .unwrap()
            .with_base_url(&format!("http://{addr}"));
        let request = GenerateRequest::new("gemini-2.5-flash").text("hello");

        let result = tokio::time::timeout(Duration::from_secs(5), client.generate(&request))
            .await
            .expect("client timeout should fire before the outer one");
        let err = result.unwrap_err();
        assert!(matches!(&err, AiError::Http(e) if e.is_timeout()), "{err}");
        assert!(err.is_retryable());
        drop(listener);
    }
}
