//! Offline fallback formatter
//!
//! Deterministic and infallible: a top-level heading, the specification
//! verbatim, then every corpus entry under its own heading in corpus order.

use super::{ProviderFailure, StructuringProvider, StructuringRequest};
use crate::models::{ExtractionResult, ProviderKind};
use async_trait::async_trait;

pub const DEFAULT_FALLBACK_TITLE: &str = "Engineering Document";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFallbackStyle {
    /// Text of the `#` heading
    pub title: String,
}

impl Default for LocalFallbackStyle {
    fn default() -> Self {
        Self {
            title: DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocalFormatter {
    style: LocalFallbackStyle,
}

impl LocalFormatter {
    pub fn new(style: LocalFallbackStyle) -> Self {
        Self { style }
    }

    pub fn format(&self, specification: &str, corpus: &[ExtractionResult]) -> String {
        let mut text = format!(
            "# {}\n\n## Compiled from extracted content\n\n### Document Specification\n{}\n\n",
            self.style.title, specification
        );

        let entries = corpus
            .iter()
            .map(|entry| {
                format!(
                    "### {} ({})\n\n{}",
                    entry.source_file_name, entry.format_tag, entry.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        text.push_str(&entries);

        text
    }
}

#[async_trait]
impl StructuringProvider for LocalFormatter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn attempt(&self, request: &StructuringRequest) -> Result<String, ProviderFailure> {
        tracing::info!(
            "[LocalFormatter] Formatting {} corpus entries offline",
            request.corpus.len()
        );
        Ok(self.format(&request.specification, &request.corpus))
    }
}
