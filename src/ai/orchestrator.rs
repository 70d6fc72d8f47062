//! Provider chain
//!
//! Turns a corpus and a document specification into one `StructuringOutcome`
//! by trying remote providers strictly in priority order, each under its own
//! retry policy, then the offline formatter when enabled. Providers never run
//! concurrently.

use super::credentials::{CredentialManager, KeyedProvider};
use super::http_client::client_with_timeout;
use super::prompts::build_structuring_prompt;
use super::providers::{
    GeminiProvider, LocalFallbackStyle, LocalFormatter, OpenAiProvider, StructuringProvider,
    StructuringRequest,
};
use super::retry::{retry_with_backoff, RetryPolicy, Sleeper, TokioSleeper};
use crate::config::PipelineConfig;
use crate::models::{
    emit, ExtractionResult, PipelineEvent, ProgressCallback, ProviderKind, StructuringOutcome,
};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuringError {
    #[error("Nothing to structure: the corpus is empty")]
    EmptyCorpus,

    #[error("All providers failed and local fallback is disabled ({0})")]
    Exhausted(String),
}

pub struct StructuringOrchestrator {
    remote: Vec<Arc<dyn StructuringProvider>>,
    fallback: Option<Arc<dyn StructuringProvider>>,
    sleeper: Arc<dyn Sleeper>,
    progress: Option<ProgressCallback>,
}

impl StructuringOrchestrator {
    /// Chain over `remote` (priority order) with the default offline fallback
    pub fn new(remote: Vec<Arc<dyn StructuringProvider>>) -> Self {
        Self {
            remote,
            fallback: Some(Arc::new(LocalFormatter::default())),
            sleeper: Arc::new(TokioSleeper),
            progress: None,
        }
    }

    /// Gemini, then OpenAI with backoff, then the offline formatter if enabled
    pub fn from_config(config: &PipelineConfig, style: LocalFallbackStyle) -> Self {
        let client = client_with_timeout(config.http_timeout);

        let gemini = GeminiProvider::new(
            client.clone(),
            config.gemini_endpoint.clone(),
            CredentialManager::get_api_key(KeyedProvider::Gemini).ok(),
        );
        let openai = OpenAiProvider::new(
            client,
            config.openai_endpoint.clone(),
            config.openai_model.clone(),
            CredentialManager::get_api_key(KeyedProvider::OpenAi).ok(),
        )
        .with_temperature(config.openai_temperature)
        .with_retry_policy(RetryPolicy::exponential(
            config.max_retries,
            config.backoff_base,
        ));

        let fallback = config.fallback_to_local.then(|| LocalFormatter::new(style));

        let remote: Vec<Arc<dyn StructuringProvider>> = vec![Arc::new(gemini), Arc::new(openai)];
        Self::new(remote).with_fallback(fallback)
    }

    /// Replace (or with `None`, disable) the offline fallback
    pub fn with_fallback(mut self, fallback: Option<LocalFormatter>) -> Self {
        self.fallback = fallback.map(|f| Arc::new(f) as Arc<dyn StructuringProvider>);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback.is_some()
    }

    /// Produce exactly one outcome, or fail when every link is unusable
    pub async fn structure(
        &self,
        corpus: &[ExtractionResult],
        specification: &str,
    ) -> Result<StructuringOutcome, StructuringError> {
        if corpus.is_empty() {
            return Err(StructuringError::EmptyCorpus);
        }

        let request = StructuringRequest {
            prompt: build_structuring_prompt(specification, corpus),
            specification: specification.to_string(),
            corpus: corpus.to_vec(),
        };
        let mut reasons = Vec::new();

        for provider in &self.remote {
            let kind = provider.kind();
            let policy = provider.retry_policy();

            let result = retry_with_backoff(
                &policy,
                self.sleeper.as_ref(),
                |_| provider.attempt(&request),
                |failure| provider.backoff(failure),
                |attempt, failure| {
                    tracing::warn!(
                        provider = %kind,
                        attempt,
                        "[Orchestrator] Attempt failed: {}",
                        failure
                    );
                    emit(
                        &self.progress,
                        PipelineEvent::ProviderAttemptFailed {
                            provider: kind,
                            attempt,
                            reason: failure.to_string(),
                        },
                    );
                },
            )
            .await;

            match result {
                Ok(text) => return Ok(self.complete(text, kind)),
                Err(failure) => {
                    tracing::info!("[Orchestrator] Escalating past {}", kind);
                    reasons.push(format!("{}: {}", kind, failure));
                }
            }
        }

        let Some(fallback) = &self.fallback else {
            tracing::error!("[Orchestrator] Remote providers exhausted, fallback disabled");
            return Err(StructuringError::Exhausted(reasons.join("; ")));
        };

        tracing::warn!("[Orchestrator] Remote providers unavailable, using local formatting");
        emit(&self.progress, PipelineEvent::FallbackEngaged);

        match fallback.attempt(&request).await {
            Ok(text) => Ok(self.complete(text, fallback.kind())),
            Err(failure) => {
                reasons.push(format!("{}: {}", fallback.kind(), failure));
                Err(StructuringError::Exhausted(reasons.join("; ")))
            }
        }
    }

    fn complete(&self, text: String, kind: ProviderKind) -> StructuringOutcome {
        tracing::info!(
            "[Orchestrator] Structured document from {} ({} chars)",
            kind,
            text.len()
        );
        emit(
            &self.progress,
            PipelineEvent::StructuringComplete { provider: kind },
        );
        StructuringOutcome {
            text,
            source_provider: kind,
        }
    }
}
