//! Structuring providers
//!
//! Each link of the provider chain turns one `StructuringRequest` into
//! structured text. Remote providers report why an attempt failed so the
//! orchestrator can decide between retrying and escalating.

pub mod gemini;
pub mod local;
pub mod openai;

pub use gemini::GeminiProvider;
pub use local::{LocalFallbackStyle, LocalFormatter};
pub use openai::OpenAiProvider;

use super::retry::{Backoff, RetryPolicy};
use crate::models::{ExtractionResult, ProviderKind};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Longest error body kept in a failure reason
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Why a single provider attempt failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderFailure {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response has no usable text: {0}")]
    MissingText(String),

    #[error("Provider not configured: {0}")]
    Unconfigured(String),
}

impl ProviderFailure {
    /// Rate limiting and transport failures are worth another attempt.
    /// A rate limit still waits out its delay after the final attempt;
    /// a transport error on the final attempt escalates immediately.
    pub fn backoff(&self) -> Backoff {
        match self {
            Self::RateLimited => Backoff::RetryWaitingAfterLast,
            Self::Transport(_) => Backoff::Retry,
            _ => Backoff::Stop,
        }
    }
}

/// Everything a provider may need for one structuring run
#[derive(Debug, Clone)]
pub struct StructuringRequest {
    /// Combined prompt for remote providers
    pub prompt: String,
    pub specification: String,
    pub corpus: Vec<ExtractionResult>,
}

#[async_trait]
pub trait StructuringProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// How often the orchestrator may call `attempt` before escalating
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::single()
    }

    /// How a failure is treated under `retry_policy`
    fn backoff(&self, _failure: &ProviderFailure) -> Backoff {
        Backoff::Stop
    }

    async fn attempt(&self, request: &StructuringRequest) -> Result<String, ProviderFailure>;
}

/// Send a request and decode a JSON body, classifying every failure
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderFailure> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderFailure::Transport(e.without_url().to_string()))?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderFailure::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderFailure::Status {
            status: status.as_u16(),
            body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderFailure::MissingText(format!("unexpected body: {}", e.without_url())))
}

/// Reject absent or blank text
pub(crate) fn require_text(text: Option<String>, field: &str) -> Result<String, ProviderFailure> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(ProviderFailure::MissingText(format!("{} is empty", field))),
        None => Err(ProviderFailure::MissingText(format!("{} is missing", field))),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Serves one canned HTTP response per connection on 127.0.0.1
#[cfg(test)]
pub(crate) async fn serve_canned(status: &'static str, body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}", addr)
}

/// Headers received and `Content-Length` bytes of body read
#[cfg(test)]
fn request_complete(request: &[u8]) -> bool {
    let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let length = String::from_utf8_lossy(&request[..header_end])
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    request.len() >= header_end + 4 + length
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_by_failure_kind() {
        assert_eq!(
            ProviderFailure::RateLimited.backoff(),
            Backoff::RetryWaitingAfterLast
        );
        assert_eq!(ProviderFailure::Transport("reset".into()).backoff(), Backoff::Retry);
        assert_eq!(
            ProviderFailure::Status {
                status: 503,
                body: String::new()
            }
            .backoff(),
            Backoff::Stop
        );
        assert_eq!(ProviderFailure::MissingText("x".into()).backoff(), Backoff::Stop);
        assert_eq!(ProviderFailure::Unconfigured("x".into()).backoff(), Backoff::Stop);
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(Some("# Doc".into()), "text"), Ok("# Doc".to_string()));
        assert!(matches!(
            require_text(Some("  \n".into()), "text"),
            Err(ProviderFailure::MissingText(_))
        ));
        assert!(matches!(
            require_text(None, "text"),
            Err(ProviderFailure::MissingText(_))
        ));
    }

    #[test]
    fn test_request_complete_waits_for_body() {
        assert!(!request_complete(b"POST / HTTP/1.1\r\ncontent-length: 4\r\n"));
        assert!(!request_complete(b"POST / HTTP/1.1\r\ncontent-length: 4\r\n\r\n{}"));
        assert!(request_complete(b"POST / HTTP/1.1\r\ncontent-length: 4\r\n\r\n{\"\"}"));
    }

    #[tokio::test]
    async fn test_send_json_classifies_statuses() {
        async fn send(status: &'static str, body: &'static str) -> ProviderFailure {
            let url = serve_canned(status, body).await;
            send_json::<serde_json::Value>(reqwest::Client::new().post(url).body("{}"))
                .await
                .unwrap_err()
        }

        assert_eq!(send("429 Too Many Requests", "{}").await, ProviderFailure::RateLimited);
        assert_eq!(
            send("500 Internal Server Error", "boom").await,
            ProviderFailure::Status {
                status: 500,
                body: "boom".to_string()
            }
        );
        assert!(matches!(
            send("200 OK", "not json").await,
            ProviderFailure::MissingText(_)
        ));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("ok", 5), "ok");
    }
}
