//! PDF text extraction via pdf-extract

use super::{ExtractionError, TextExtractor};
use crate::models::FormatTag;

/// Extracts page text in document order, pages separated by a blank line
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Collapse a page's text tokens into one line, keeping parser order
    fn join_tokens(page: &str) -> String {
        page.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Join per-page text with a blank-line separator
    pub(crate) fn join_pages(pages: &[String]) -> String {
        pages
            .iter()
            .map(|page| Self::join_tokens(page))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdfExtractor {
    fn format(&self) -> FormatTag {
        FormatTag::Pdf
    }

    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        tracing::debug!("[PdfExtractor] {} ({} bytes)", file_name, bytes.len());

        // pdf-extract (and its font parsers) can panic on malformed glyph data
        let pages = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        })) {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                tracing::warn!("[PdfExtractor] Extraction failed for {}: {}", file_name, e);
                return Err(ExtractionError::PdfParsing(e.to_string()));
            }
            Err(_panic) => {
                tracing::error!(
                    "[PdfExtractor] Parser panicked on {} - likely malformed font/glyph",
                    file_name
                );
                return Err(ExtractionError::PdfPanic);
            }
        };

        let text = Self::join_pages(&pages);
        tracing::info!(
            "[PdfExtractor] {}: {} pages, {} chars",
            file_name,
            pages.len(),
            text.len()
        );

        Ok(text)
    }
}
