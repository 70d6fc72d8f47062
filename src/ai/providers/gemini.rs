//! Provider A: generative-text endpoint (Gemini `generateContent`)
//!
//! Tried once. Any failure escalates to the next provider. The key travels
//! as a query parameter, so transport errors are reported without the URL.

use super::{require_text, send_json, ProviderFailure, StructuringProvider, StructuringRequest};
use crate::models::ProviderKind;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn request_body(prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        }
    }

    /// `candidates[0].content.parts[0].text`
    fn response_text(response: GenerateResponse) -> Result<String, ProviderFailure> {
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);
        require_text(text, "candidates[0].content.parts[0].text")
    }
}

#[async_trait]
impl StructuringProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ProviderA
    }

    async fn attempt(&self, request: &StructuringRequest) -> Result<String, ProviderFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderFailure::Unconfigured("GEMINI_API_KEY is not set".to_string()))?;

        tracing::info!(
            "[Gemini] Requesting structured document ({} prompt chars)",
            request.prompt.len()
        );

        let response: GenerateResponse = send_json(
            self.client
                .post(&self.endpoint)
                .query(&[("key", api_key)])
                .json(&Self::request_body(&request.prompt)),
        )
        .await?;

        Self::response_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::providers::serve_canned;
    use crate::ai::retry::Backoff;

    fn request() -> StructuringRequest {
        StructuringRequest {
            prompt: "Transform this".to_string(),
            specification: "spec".to_string(),
            corpus: Vec::new(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GeminiProvider::request_body("hello")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "contents": [{ "parts": [{ "text": "hello" }] }] })
        );
    }

    #[test]
    fn test_reads_first_candidate_text() {
        let response: GenerateResponse = serde_json::from_str(
            r##"{"candidates":[{"content":{"parts":[{"text":"# Doc"},{"text":"ignored"}]}},{"content":{"parts":[{"text":"other"}]}}]}"##,
        )
        .unwrap();
        assert_eq!(GeminiProvider::response_text(response).unwrap(), "# Doc");
    }

    #[test]
    fn test_missing_text_field_is_failure() {
        for raw in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{"finishReason":"SAFETY"}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
        ] {
            let response: GenerateResponse = serde_json::from_str(raw).unwrap();
            assert!(
                matches!(
                    GeminiProvider::response_text(response),
                    Err(ProviderFailure::MissingText(_))
                ),
                "{} should fail",
                raw
            );
        }
    }

    #[tokio::test]
    async fn test_without_key_is_unconfigured() {
        let provider = GeminiProvider::new(Client::new(), "http://127.0.0.1:9", None);
        let err = provider.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderFailure::Unconfigured(_)));
        assert_eq!(provider.backoff(&err), Backoff::Stop);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        let provider = GeminiProvider::new(
            Client::new(),
            "http://127.0.0.1:9/generate",
            Some("test-key".to_string()),
        );
        let err = provider.attempt(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderFailure::Transport(_)));
        assert!(!err.to_string().contains("test-key"));
    }

    async fn failure_from(status: &'static str, body: &'static str) -> ProviderFailure {
        let base = serve_canned(status, body).await;
        let provider = GeminiProvider::new(
            Client::new(),
            format!("{}/v1beta/models/gemini-pro:generateContent", base),
            Some("gemini-secret-key".to_string()),
        );
        let err = provider.attempt(&request()).await.unwrap_err();
        assert!(!err.to_string().contains("gemini-secret-key"), "{}", err);
        err
    }

    #[tokio::test]
    async fn test_rate_limit_response_is_rate_limited() {
        assert_eq!(
            failure_from("429 Too Many Requests", r#"{"error":{"code":429}}"#).await,
            ProviderFailure::RateLimited
        );
    }

    #[tokio::test]
    async fn test_server_error_is_status_failure() {
        let err = failure_from("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        assert_eq!(
            err,
            ProviderFailure::Status {
                status: 500,
                body: r#"{"error":"boom"}"#.to_string()
            }
        );
        assert_eq!(err.backoff(), Backoff::Stop);
    }

    #[tokio::test]
    async fn test_empty_or_invalid_body_is_missing_text() {
        assert!(matches!(
            failure_from("200 OK", "{}").await,
            ProviderFailure::MissingText(_)
        ));
        assert!(matches!(
            failure_from("200 OK", "<html>").await,
            ProviderFailure::MissingText(_)
        ));
    }

    #[tokio::test]
    async fn test_success_response_yields_text() {
        let base = serve_canned(
            "200 OK",
            r##"{"candidates":[{"content":{"parts":[{"text":"# Doc"}]}}]}"##,
        )
        .await;
        let provider = GeminiProvider::new(Client::new(), base, Some("k".to_string()));
        assert_eq!(provider.attempt(&request()).await.unwrap(), "# Doc");
    }
}
