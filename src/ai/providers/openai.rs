//! Provider B: chat-completion endpoint (OpenAI)
//!
//! Retried on HTTP 429 and transport errors with exponential backoff.

use super::{require_text, send_json, ProviderFailure, StructuringProvider, StructuringRequest};
use crate::ai::retry::{Backoff, RetryPolicy};
use crate::models::ProviderKind;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
    policy: RetryPolicy,
}

impl OpenAiProvider {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            temperature: 0.7,
            api_key,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        }
    }

    /// `choices[0].message.content`
    fn response_text(response: ChatResponse) -> Result<String, ProviderFailure> {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        require_text(text, "choices[0].message.content")
    }
}

#[async_trait]
impl StructuringProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ProviderB
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    fn backoff(&self, failure: &ProviderFailure) -> Backoff {
        failure.backoff()
    }

    async fn attempt(&self, request: &StructuringRequest) -> Result<String, ProviderFailure> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderFailure::Unconfigured("OPENAI_API_KEY is not set".to_string()))?;

        tracing::info!(
            "[OpenAI] Requesting structured document from {} ({} prompt chars)",
            self.model,
            request.prompt.len()
        );

        let response: ChatResponse = send_json(
            self.client
                .post(&self.endpoint)
                .bearer_auth(api_key)
                .json(&self.request_body(&request.prompt)),
        )
        .await?;

        Self::response_text(response)
    }
}
