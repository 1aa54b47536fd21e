//! Remote model boundary and the Gemini REST transport.
//!
//! The orchestrator only ever sees [`RemoteModel`]: "given a model id, prompt
//! parts and one credential, return text or a [`RemoteError`]". The
//! production implementation, [`GeminiClient`], posts to
//! `{base_url}/v1beta/models/{model}:generateContent`; tests substitute a
//! scripted model.
//!
//! The client never retries. Retrying with another key is the rotating
//! caller's job, and it needs the raw HTTP status to decide.

use crate::config::JobConfig;
use crate::error::{Doc2WordError, RemoteError};
use crate::keys::Credential;
use crate::pipeline::request::PromptPart;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// `finishReason` values that mean the output was withheld.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// A text-generating remote model.
#[async_trait]
pub trait RemoteModel: Send + Sync {
    /// Run one generation with one credential.
    async fn generate(
        &self,
        model: &str,
        parts: &[PromptPart],
        credential: &Credential,
    ) -> Result<String, RemoteError>;
}

/// Gemini `generateContent` over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Doc2WordError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Doc2WordError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &JobConfig) -> Result<Self, Doc2WordError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.api_timeout_secs),
        )
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

#[async_trait]
impl RemoteModel for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        parts: &[PromptPart],
        credential: &Credential,
    ) -> Result<String, RemoteError> {
        let body = GenerateRequest::from_parts(parts);
        debug!(
            "POST {} ({} parts, key {})",
            self.endpoint(model),
            parts.len(),
            credential.masked()
        );

        let response = self
            .http
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let text = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(http_error(status.as_u16(), &text));
        }
        extract_text(&text)
    }
}

fn network_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Network {
        timeout: e.is_timeout(),
        message: e.to_string(),
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl GenerateRequest {
    fn from_parts(parts: &[PromptPart]) -> Self {
        let parts = parts
            .iter()
            .map(|p| match p {
                PromptPart::Text(t) => Part {
                    text: Some(t.clone()),
                    inline_data: None,
                },
                PromptPart::Inline { mime_type, data } => Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: mime_type.clone(),
                        data: STANDARD.encode(data),
                    }),
                },
            })
            .collect();
        Self {
            contents: vec![Content {
                role: Some("user".into()),
                parts,
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget: 0 },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Map a non-2xx response to [`RemoteError::Http`].
///
/// The most specific reason wins: a `details[].reason` such as
/// `API_KEY_INVALID` over the coarse `status` (`INVALID_ARGUMENT`).
fn http_error(status: u16, body: &str) -> RemoteError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let reason = env
                .error
                .details
                .iter()
                .find_map(|d| d.reason.clone())
                .or(env.error.status);
            RemoteError::Http {
                status,
                reason,
                message: env.error.message,
            }
        }
        Err(_) => RemoteError::Http {
            status,
            reason: None,
            message: body.trim().to_string(),
        },
    }
}

/// Pull the generated text out of a 2xx body.
fn extract_text(body: &str) -> Result<String, RemoteError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::InvalidResponse {
            message: e.to_string(),
        })?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(RemoteError::Blocked { reason });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::InvalidResponse {
            message: "response has no candidates".into(),
        })?;

    let text: String = candidate
        .content
        .unwrap_or_default()
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        if let Some(reason) = candidate
            .finish_reason
            .filter(|r| BLOCKING_FINISH_REASONS.contains(&r.as_str()))
        {
            return Err(RemoteError::Blocked { reason });
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_wire_format() {
        let parts = vec![
            PromptPart::Text("TASK".into()),
            PromptPart::Inline {
                mime_type: "image/png".into(),
                data: b"hi".to_vec(),
            },
        ];
        let json = serde_json::to_value(GenerateRequest::from_parts(&parts)).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "TASK");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "aGk=");
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            0
        );
        assert!(json["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn extract_joins_candidate_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(extract_text(body).unwrap(), "ab");
    }

    #[test]
    fn prompt_block_is_reported() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        assert_eq!(
            extract_text(body).unwrap_err(),
            RemoteError::Blocked {
                reason: "SAFETY".into()
            }
        );
    }

    #[test]
    fn empty_safety_candidate_is_blocked() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert!(matches!(
            extract_text(body),
            Err(RemoteError::Blocked { .. })
        ));
    }

    #[test]
    fn garbage_body_is_invalid_response() {
        assert!(matches!(
            extract_text("<html>oops</html>"),
            Err(RemoteError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn error_detail_reason_beats_status() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        assert_eq!(
            http_error(400, body),
            RemoteError::Http {
                status: 400,
                reason: Some("API_KEY_INVALID".into()),
                message: "API key not valid. Please pass a valid API key.".into(),
            }
        );
    }

    #[test]
    fn non_json_error_keeps_raw_body() {
        assert_eq!(
            http_error(502, " Bad Gateway \n"),
            RemoteError::Http {
                status: 502,
                reason: None,
                message: "Bad Gateway".into(),
            }
        );
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let c = GeminiClient::new("http://localhost:1234/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            c.endpoint("gemini-x"),
            "http://localhost:1234/v1beta/models/gemini-x:generateContent"
        );
    }
}
