//! Word (.docx) raw text extraction via docx-rs

use super::{ExtractionError, TextExtractor};
use crate::models::FormatTag;

/// Raw text only: no styling, no embedded objects. Paragraphs are separated
/// by a blank line, table cells by tabs.
pub struct WordExtractor;

impl WordExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Walk the document body once, collecting paragraph texts
    fn collect_paragraphs(doc: &docx_rs::Docx) -> Vec<String> {
        let mut paragraphs = Vec::new();

        for child in &doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(para) => {
                    paragraphs.push(Self::paragraph_text(para));
                }
                docx_rs::DocumentChild::Table(table) => {
                    let rows: Vec<String> = table
                        .rows
                        .iter()
                        .map(|row| {
                            let docx_rs::TableChild::TableRow(tr) = row;
                            tr.cells
                                .iter()
                                .map(|cell| {
                                    let docx_rs::TableRowChild::TableCell(tc) = cell;
                                    tc.children
                                        .iter()
                                        .filter_map(|content| match content {
                                            docx_rs::TableCellContent::Paragraph(para) => {
                                                Some(Self::paragraph_text(para))
                                            }
                                            _ => None,
                                        })
                                        .collect::<Vec<_>>()
                                        .join(" ")
                                })
                                .collect::<Vec<_>>()
                                .join("\t")
                        })
                        .collect();
                    paragraphs.push(rows.join("\n"));
                }
                _ => {}
            }
        }

        paragraphs
    }

    fn paragraph_text(para: &docx_rs::Paragraph) -> String {
        let mut out = String::new();
        for child in &para.children {
            match child {
                docx_rs::ParagraphChild::Run(run) => Self::push_run(run, &mut out),
                docx_rs::ParagraphChild::Hyperlink(link) => {
                    for link_child in &link.children {
                        if let docx_rs::ParagraphChild::Run(run) = link_child {
                            Self::push_run(run, &mut out);
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn push_run(run: &docx_rs::Run, out: &mut String) {
        for run_child in &run.children {
            match run_child {
                docx_rs::RunChild::Text(text) => out.push_str(&text.text),
                docx_rs::RunChild::Tab(_) => out.push('\t'),
                docx_rs::RunChild::Break(_) => out.push('\n'),
                _ => {}
            }
        }
    }
}

impl Default for WordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for WordExtractor {
    fn format(&self) -> FormatTag {
        FormatTag::Word
    }

    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        let doc = docx_rs::read_docx(bytes)
            .map_err(|e| ExtractionError::Word(format!("Failed to parse DOCX: {}", e)))?;

        let text = Self::collect_paragraphs(&doc)
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        tracing::info!(
            "[WordExtractor] {}: {} chars, {} words",
            file_name,
            text.len(),
            text.split_whitespace().count()
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut cursor = Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_paragraphs_in_order() {
        let bytes = build_docx(&["Executive summary", "", "Thermal limits are 85C"]);
        let text = WordExtractor::new().extract("spec.docx", &bytes).unwrap();
        assert_eq!(text, "Executive summary\n\nThermal limits are 85C");
    }

    #[test]
    fn test_empty_document_has_no_text() {
        let bytes = build_docx(&[]);
        let text = WordExtractor::new().extract("empty.docx", &bytes).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_legacy_binary_doc_fails() {
        let bytes = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        let err = WordExtractor::new().extract("old.doc", &bytes).unwrap_err();
        assert!(matches!(err, ExtractionError::Word(_)));
    }
}
