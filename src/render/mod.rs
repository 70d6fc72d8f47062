//! Document rendering
//!
//! Structured text -> `RenderedDocument` (pure layout) -> PDF bytes.
//! Bytes are produced entirely in memory; a failed render never leaves a
//! partial file behind.

pub mod layout;
pub mod metrics;
pub mod pdf_writer;

pub use layout::{
    layout, segment, Align, Block, BlockStyle, Page, RenderOptions, RenderedDocument, TextRun,
};
pub use metrics::FontStyle;

use crate::models::{emit, ExtractionResult, PipelineEvent, ProgressCallback};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default `<kind>` of an output file name
pub const DEFAULT_DOCUMENT_KIND: &str = "engineering_document";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render: structured text is empty")]
    EmptyInput,

    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("Failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Laid-out pages plus the serialized PDF
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub document: RenderedDocument,
    pub bytes: Vec<u8>,
}

pub struct DocumentRenderer {
    options: RenderOptions,
    title: String,
    progress: Option<ProgressCallback>,
}

impl DocumentRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            title: "Structured Document".to_string(),
            progress: None,
        }
    }

    /// PDF metadata title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Paginate and serialize. `sources` feed the optional appendix page.
    pub fn render(
        &self,
        text: &str,
        sources: &[ExtractionResult],
    ) -> Result<RenderOutput, RenderError> {
        let source_lines: Vec<String> = sources
            .iter()
            .map(|s| format!("{} ({})", s.source_file_name, s.format_tag))
            .collect();

        let document = layout::layout(text, &source_lines, &self.options)?;
        let bytes = pdf_writer::write_pdf(&document, &self.options, &self.title)?;

        tracing::info!(
            "[DocumentRenderer] Rendered {} pages ({} bytes)",
            document.page_count(),
            bytes.len()
        );
        emit(
            &self.progress,
            PipelineEvent::RenderComplete {
                pages: document.page_count(),
            },
        );

        Ok(RenderOutput { document, bytes })
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

/// `<kind>_<YYYY-MM-DD>.pdf`
pub fn output_file_name(kind: &str, date: NaiveDate) -> String {
    format!("{}_{}.pdf", kind, date.format("%Y-%m-%d"))
}

/// The user's download directory, else the working directory
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Write through a temp file in `dir` and rename into place
pub fn write_atomically(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, RenderError> {
    let target = dir.join(name);
    let persist_err = |source| RenderError::Persist {
        path: target.clone(),
        source,
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(persist_err)?;
    temp.write_all(bytes).map_err(persist_err)?;
    temp.as_file().sync_all().map_err(persist_err)?;
    temp.persist(&target).map_err(|e| persist_err(e.error))?;

    tracing::info!("[DocumentRenderer] Saved {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventLog, FormatTag};

    #[test]
    fn test_output_file_name_embeds_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            output_file_name(DEFAULT_DOCUMENT_KIND, date),
            "engineering_document_2024-03-07.pdf"
        );
        assert_eq!(
            output_file_name("document_summary", date),
            "document_summary_2024-03-07.pdf"
        );
    }

    #[test]
    fn test_render_produces_pdf_and_event() {
        let log = EventLog::new();
        let renderer = DocumentRenderer::default().with_progress(log.callback());

        let output = renderer.render("# Title\n\nBody", &[]).unwrap();

        assert!(output.bytes.starts_with(b"%PDF-"));
        assert_eq!(output.document.page_count(), 1);
        assert_eq!(log.events(), vec![PipelineEvent::RenderComplete { pages: 1 }]);
    }

    #[test]
    fn test_render_with_source_appendix() {
        let renderer = DocumentRenderer::new(RenderOptions {
            source_appendix: true,
            ..RenderOptions::default()
        });
        let sources = vec![ExtractionResult::succeeded(
            "design.pdf",
            FormatTag::Pdf,
            "x".to_string(),
        )];

        let output = renderer.render("Body", &sources).unwrap();

        assert_eq!(output.document.page_count(), 2);
        assert!(output.document.texts().any(|t| t == "design.pdf (PDF)"));
    }

    #[test]
    fn test_empty_text_fails_without_output() {
        let log = EventLog::new();
        let renderer = DocumentRenderer::default().with_progress(log.callback());

        assert!(matches!(renderer.render("  \n ", &[]), Err(RenderError::EmptyInput)));
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_write_atomically_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.pdf"), b"old").unwrap();

        let path = write_atomically(dir.path(), "out.pdf", b"%PDF-new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            write_atomically(&missing, "out.pdf", b"x"),
            Err(RenderError::Persist { .. })
        ));
    }
}
