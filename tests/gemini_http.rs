//! `GeminiClient` against a local mock server: wire format, error mapping,
//! and key rotation over real HTTP.

use edgequake_doc2word::pipeline::classify::{classify, FailureKind};
use edgequake_doc2word::{
    format_text, Credential, GeminiClient, JobConfig, JobOutcome, KeyPool, PromptPart,
    RemoteError, RemoteModel,
};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn success_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{"text": text}],
                "role": "model"
            },
            "finishReason": "STOP"
        }]
    })
}

fn error_body(code: u16, status: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": { "code": code, "message": message, "status": status }
    })
}

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(server.uri(), Duration::from_secs(5)).expect("client")
}

fn key(k: &str) -> Credential {
    Credential::new(k).expect("non-empty key")
}

#[tokio::test]
async fn sends_key_header_and_inline_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "AIzaKeyOne"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{
                "parts": [
                    {"text": "TASK"},
                    {"inlineData": {"mimeType": "image/png", "data": "AQID"}}
                ]
            }],
            "generationConfig": {"thinkingConfig": {"thinkingBudget": 0}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body("نص مستخرج")))
        .expect(1)
        .mount(&server)
        .await;

    let parts = vec![
        PromptPart::Text("TASK".into()),
        PromptPart::Inline {
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
        },
    ];
    let text = client(&server)
        .generate("gemini-test", &parts, &key("AIzaKeyOne"))
        .await
        .expect("200 should yield text");
    assert_eq!(text, "نص مستخرج");
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/v1beta/models/.*:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(error_body(
            429,
            "RESOURCE_EXHAUSTED",
            "Quota exceeded",
        )))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate("m", &[PromptPart::Text("x".into())], &key("k"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RemoteError::Http {
            status: 429,
            reason: Some("RESOURCE_EXHAUSTED".into()),
            message: "Quota exceeded".into(),
        }
    );
    assert_eq!(classify(&err), FailureKind::RateLimited);
}

#[tokio::test]
async fn invalid_key_body_maps_to_invalid_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID"
                }]
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate("m", &[PromptPart::Text("x".into())], &key("bad"))
        .await
        .unwrap_err();
    assert_eq!(classify(&err), FailureKind::InvalidCredential);
}

#[tokio::test]
async fn plain_text_503_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate("m", &[PromptPart::Text("x".into())], &key("k"))
        .await
        .unwrap_err();
    assert_eq!(classify(&err), FailureKind::Transient);
}

#[tokio::test]
async fn blocked_prompt_is_content_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate("m", &[PromptPart::Text("x".into())], &key("k"))
        .await
        .unwrap_err();
    assert_eq!(classify(&err), FailureKind::ContentRejected);
}

#[tokio::test]
async fn slow_server_times_out_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(success_body("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let slow = GeminiClient::new(server.uri(), Duration::from_millis(200)).expect("client");
    let err = slow
        .generate("m", &[PromptPart::Text("x".into())], &key("k"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Network { timeout: true, .. }), "{err:?}");
    assert_eq!(classify(&err), FailureKind::Transient);
}

#[tokio::test]
async fn job_rotates_past_rate_limited_key_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-goog-api-key", "key-A"))
        .respond_with(ResponseTemplate::new(429).set_body_json(error_body(
            429,
            "RESOURCE_EXHAUSTED",
            "quota",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-goog-api-key", "key-B"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(success_body("```html\n<p>ok</p>\n```")),
        )
        .mount(&server)
        .await;

    let config = JobConfig::builder()
        .base_url(server.uri())
        .pacing_ms(0)
        .build()
        .expect("config");
    let pool = KeyPool::new(["key-A", "key-B"]);

    let outcome = format_text("نص قصير", false, &pool, &config)
        .await
        .expect("job should start");
    let output = match outcome {
        JobOutcome::Completed(output) => output,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(output.text, "<p>ok</p>");
    assert_eq!(output.units[0].attempts, 2);
}
