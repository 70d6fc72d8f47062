//! Multi-format text extraction
//!
//! ## Supported Formats
//! - PDF: per-page text via pdf-extract
//! - Excel: .xlsx, .xls via calamine, .csv passthrough
//! - Word: .docx via docx-rs
//! - Image: OCR via the tesseract executable
//!
//! Each format is a `TextExtractor` registered in an `ExtractorRegistry`.
//! The `ExtractionEngine` fans a batch out over the registry and absorbs
//! per-file failures into `ExtractionResult` data.

pub mod classifier;
pub mod engine;
pub mod excel;
pub mod image;
pub mod pdf;
pub mod registry;
pub mod word;

pub use classifier::{classify, intake, is_supported, Intake, RejectReason, RejectedFile};
pub use engine::ExtractionEngine;
pub use excel::ExcelExtractor;
pub use image::{ImageExtractor, OcrEngine, TesseractCli, OCR_CHAR_WHITELIST};
pub use pdf::PdfExtractor;
pub use registry::ExtractorRegistry;
pub use word::WordExtractor;

use crate::models::FormatTag;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF parser panicked - likely contains malformed fonts")]
    PdfPanic,

    #[error("Spreadsheet parsing failed: {0}")]
    Spreadsheet(String),

    #[error("Word document parsing failed: {0}")]
    Word(String),

    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Text encoding error: {0}")]
    Encoding(String),

    #[error("No text content found")]
    NoText,

    #[error("No extractor registered for {0} files")]
    NoExtractor(FormatTag),

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

/// Format-specific text extraction over a file's raw bytes
pub trait TextExtractor: Send + Sync {
    /// Format this extractor handles
    fn format(&self) -> FormatTag;

    /// Convert raw bytes into plain text.
    /// The file name is passed for sub-format decisions (e.g. csv vs xlsx).
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError>;
}
