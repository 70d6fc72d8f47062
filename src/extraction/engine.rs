//! Batch extraction
//!
//! One blocking task per file, joined with a join-all barrier. A file's
//! failure (parse error, panic, missing extractor) becomes a failed
//! `ExtractionResult` and never affects its siblings. The corpus is
//! assembled in input order, not completion order.

use super::{ExtractionError, ExtractorRegistry};
use crate::models::{
    emit, Corpus, ExtractionResult, FormatTag, PipelineEvent, ProgressCallback, SourceFile,
};
use futures::future::join_all;
use std::sync::Arc;

pub struct ExtractionEngine {
    registry: Arc<ExtractorRegistry>,
    progress: Option<ProgressCallback>,
}

impl ExtractionEngine {
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            progress: None,
        }
    }

    /// Attach a progress sink
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Extract a batch of already-tagged files.
    /// Always returns exactly one result per input, in input order.
    pub async fn extract_batch(&self, files: &[(SourceFile, FormatTag)]) -> Corpus {
        emit(
            &self.progress,
            PipelineEvent::ExtractionStarted { total: files.len() },
        );
        tracing::info!("[ExtractionEngine] Starting extraction of {} files", files.len());

        let handles: Vec<_> = files
            .iter()
            .map(|(file, tag)| {
                let registry = Arc::clone(&self.registry);
                let file = file.clone();
                let tag = *tag;
                tokio::task::spawn_blocking(move || extract_one(&registry, &file, tag))
            })
            .collect();

        let joined = join_all(handles).await;

        let corpus: Corpus = joined
            .into_iter()
            .zip(files.iter())
            .map(|(outcome, (file, tag))| match outcome {
                Ok(result) => result,
                Err(join_error) => {
                    tracing::error!(
                        "[ExtractionEngine] Task for {} did not complete: {}",
                        file.name,
                        join_error
                    );
                    let error = ExtractionError::TaskFailed(join_error.to_string());
                    ExtractionResult::failed(&file.name, *tag, error.to_string())
                }
            })
            .collect();

        let succeeded = corpus.iter().filter(|r| r.success).count();
        let failed = corpus.len() - succeeded;

        if failed == 0 {
            tracing::info!("[ExtractionEngine] Extracted text from {} files", succeeded);
        } else {
            tracing::warn!(
                "[ExtractionEngine] Extracted from {}/{} files with some errors",
                succeeded,
                corpus.len()
            );
        }

        emit(
            &self.progress,
            PipelineEvent::ExtractionComplete { succeeded, failed },
        );

        corpus
    }
}

/// Blank output from any extractor counts as a failure
fn extract_one(
    registry: &ExtractorRegistry,
    file: &SourceFile,
    tag: FormatTag,
) -> ExtractionResult {
    let outcome = match registry.get(tag) {
        Some(extractor) => extractor.extract(&file.name, &file.bytes),
        None => Err(ExtractionError::NoExtractor(tag)),
    }
    .and_then(|text| {
        if text.trim().is_empty() {
            Err(ExtractionError::NoText)
        } else {
            Ok(text)
        }
    });

    match outcome {
        Ok(text) => ExtractionResult::succeeded(&file.name, tag, text),
        Err(e) => {
            tracing::warn!(
                "[ExtractionEngine] {} extraction failed ({}): {}",
                tag,
                file.name,
                e
            );
            ExtractionResult::failed(&file.name, tag, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::image::MockOcrEngine;
    use crate::extraction::TextExtractor;
    use crate::models::{EventLog, ERROR_SENTINEL_PREFIX};
    use std::time::Duration;

    /// Extractor returning its input as text, optionally after a delay
    struct EchoExtractor {
        format: FormatTag,
        delay: Duration,
    }

    impl TextExtractor for EchoExtractor {
        fn format(&self) -> FormatTag {
            self.format
        }

        fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
            std::thread::sleep(self.delay);
            if file_name.starts_with("slow") {
                std::thread::sleep(Duration::from_millis(50));
            }
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }

    struct PanickingExtractor;

    impl TextExtractor for PanickingExtractor {
        fn format(&self) -> FormatTag {
            FormatTag::Word
        }

        fn extract(&self, _file_name: &str, _bytes: &[u8]) -> Result<String, ExtractionError> {
            panic!("parser bug")
        }
    }

    fn mock_registry() -> ExtractorRegistry {
        ExtractorRegistry::standard(Arc::new(MockOcrEngine {
            text: "Serial 42-A".to_string(),
        }))
        .with(Arc::new(EchoExtractor {
            format: FormatTag::Pdf,
            delay: Duration::ZERO,
        }))
    }

    #[tokio::test]
    async fn test_batch_isolates_corrupted_file() {
        let engine = ExtractionEngine::new(mock_registry());
        let files = vec![
            (SourceFile::new("design.pdf", b"Design page".to_vec()), FormatTag::Pdf),
            (SourceFile::new("budget.xlsx", b"not a workbook".to_vec()), FormatTag::Excel),
            (SourceFile::new("label.png", b"\x89PNG".to_vec()), FormatTag::Image),
        ];

        let corpus = engine.extract_batch(&files).await;

        assert_eq!(corpus.len(), 3);
        let failures: Vec<_> = corpus.iter().filter(|r| !r.success).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].source_file_name, "budget.xlsx");
        assert!(failures[0].text.starts_with(ERROR_SENTINEL_PREFIX));
        assert_eq!(corpus[0].text, "Design page");
        assert_eq!(corpus[2].text, "Serial 42-A");
    }

    #[tokio::test]
    async fn test_corpus_follows_input_order_not_completion_order() {
        let engine = ExtractionEngine::new(mock_registry());
        let files = vec![
            (SourceFile::new("slow.pdf", b"first".to_vec()), FormatTag::Pdf),
            (SourceFile::new("fast.pdf", b"second".to_vec()), FormatTag::Pdf),
            (SourceFile::new("quick.pdf", b"third".to_vec()), FormatTag::Pdf),
        ];

        let corpus = engine.extract_batch(&files).await;
        let texts: Vec<_> = corpus.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_panicking_extractor_becomes_failed_result() {
        let registry = mock_registry().with(Arc::new(PanickingExtractor));
        let engine = ExtractionEngine::new(registry);
        let files = vec![
            (SourceFile::new("notes.docx", b"x".to_vec()), FormatTag::Word),
            (SourceFile::new("ok.pdf", b"fine".to_vec()), FormatTag::Pdf),
        ];

        let corpus = engine.extract_batch(&files).await;

        assert_eq!(corpus.len(), 2);
        assert!(!corpus[0].success);
        assert!(corpus[0].text.starts_with("ERROR: Failed to extract Word content"));
        assert!(corpus[1].success);
    }

    #[tokio::test]
    async fn test_unregistered_format_fails_without_aborting() {
        let engine = ExtractionEngine::new(ExtractorRegistry::new());
        let files = vec![(SourceFile::new("scan.pdf", b"x".to_vec()), FormatTag::Pdf)];

        let corpus = engine.extract_batch(&files).await;

        assert_eq!(corpus.len(), 1);
        assert!(!corpus[0].success);
        assert!(corpus[0]
            .error_detail
            .as_deref()
            .unwrap_or_default()
            .contains("No extractor registered for PDF"));
    }

    /// Third-party style extractor that reports success with no text
    struct BlankExtractor;

    impl TextExtractor for BlankExtractor {
        fn format(&self) -> FormatTag {
            FormatTag::Pdf
        }

        fn extract(&self, _file_name: &str, _bytes: &[u8]) -> Result<String, ExtractionError> {
            Ok(" \n\t".to_string())
        }
    }

    #[tokio::test]
    async fn test_blank_output_becomes_failed_result() {
        let engine = ExtractionEngine::new(mock_registry().with(Arc::new(BlankExtractor)));
        let files = vec![
            (SourceFile::new("a.pdf", b"x".to_vec()), FormatTag::Pdf),
            (SourceFile::new("blank.png", b"img".to_vec()), FormatTag::Image),
        ];

        let corpus = engine.extract_batch(&files).await;

        assert!(!corpus[0].success);
        assert_eq!(corpus[0].error_detail.as_deref(), Some("No text content found"));
        assert!(corpus[0].text.starts_with(ERROR_SENTINEL_PREFIX));
        assert!(corpus[1].success);
    }

    #[tokio::test]
    async fn test_blank_ocr_fails() {
        let registry = ExtractorRegistry::standard(Arc::new(MockOcrEngine {
            text: " \n".to_string(),
        }));
        let engine = ExtractionEngine::new(registry);
        let files = vec![(SourceFile::new("blank.png", b"img".to_vec()), FormatTag::Image)];

        let corpus = engine.extract_batch(&files).await;

        assert!(!corpus[0].success);
        assert!(corpus[0].text.starts_with(ERROR_SENTINEL_PREFIX));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let engine = ExtractionEngine::new(mock_registry());
        assert!(engine.extract_batch(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_emits_start_and_completion_counts() {
        let log = EventLog::new();
        let engine = ExtractionEngine::new(mock_registry()).with_progress(log.callback());
        let files = vec![
            (SourceFile::new("a.pdf", b"a".to_vec()), FormatTag::Pdf),
            (SourceFile::new("b.csv", vec![0xff, 0xfe]), FormatTag::Excel),
        ];

        engine.extract_batch(&files).await;

        assert_eq!(
            log.events(),
            vec![
                PipelineEvent::ExtractionStarted { total: 2 },
                PipelineEvent::ExtractionComplete {
                    succeeded: 1,
                    failed: 1
                },
            ]
        );
    }
}
