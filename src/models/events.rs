//! Progress events surfaced to whoever drives the pipeline (UI toasts, CLI logs)

use super::document::ProviderKind;
use serde::Serialize;
use std::sync::Arc;

/// Discrete pipeline milestones
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PipelineEvent {
    /// Unsupported or duplicate inputs were dropped before extraction
    FilesRejected { count: usize },
    ExtractionStarted { total: usize },
    ExtractionComplete { succeeded: usize, failed: usize },
    ProviderAttemptFailed {
        provider: ProviderKind,
        attempt: u32,
        reason: String,
    },
    FallbackEngaged,
    StructuringComplete { provider: ProviderKind },
    RenderComplete { pages: usize },
}

/// Shared progress sink
pub type ProgressCallback = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

/// Send an event if a sink is attached
pub(crate) fn emit(progress: &Option<ProgressCallback>, event: PipelineEvent) {
    if let Some(callback) = progress {
        callback(event);
    }
}

/// Collects events in memory; handy for tests and batch drivers
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<std::sync::Mutex<Vec<PipelineEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that appends into this log
    pub fn callback(&self) -> ProgressCallback {
        let events = Arc::clone(&self.events);
        Arc::new(move |event| {
            if let Ok(mut guard) = events.lock() {
                guard.push(event);
            }
        })
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        let progress = Some(log.callback());

        emit(&progress, PipelineEvent::ExtractionStarted { total: 2 });
        emit(&progress, PipelineEvent::FallbackEngaged);

        assert_eq!(
            log.events(),
            vec![
                PipelineEvent::ExtractionStarted { total: 2 },
                PipelineEvent::FallbackEngaged
            ]
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(PipelineEvent::StructuringComplete {
            provider: ProviderKind::Local,
        })
        .unwrap();
        assert_eq!(json["event"], "structuringComplete");
        assert_eq!(json["provider"], "local");
    }
}
