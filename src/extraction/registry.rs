//! FormatTag -> extractor registry

use super::{
    ExcelExtractor, ImageExtractor, OcrEngine, PdfExtractor, TesseractCli, TextExtractor,
    WordExtractor,
};
use crate::models::FormatTag;
use std::collections::HashMap;
use std::sync::Arc;

/// Adding a format means registering an extractor, not touching dispatch
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<FormatTag, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// PDF, Excel, Word and Image extractors with the given OCR engine
    pub fn standard(ocr: Arc<dyn OcrEngine>) -> Self {
        Self::new()
            .with(Arc::new(PdfExtractor::new()))
            .with(Arc::new(ExcelExtractor::new()))
            .with(Arc::new(WordExtractor::new()))
            .with(Arc::new(ImageExtractor::new(ocr)))
    }

    /// Standard registry driving the given tesseract binary
    pub fn with_tesseract(binary: &str) -> Self {
        Self::standard(Arc::new(TesseractCli::new(binary)))
    }

    /// Register (or replace) the extractor for its format
    pub fn with(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.register(extractor);
        self
    }

    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.insert(extractor.format(), extractor);
    }

    pub fn get(&self, format: FormatTag) -> Option<Arc<dyn TextExtractor>> {
        self.extractors.get(&format).cloned()
    }

    pub fn supports(&self, format: FormatTag) -> bool {
        self.extractors.contains_key(&format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::image::MockOcrEngine;

    #[test]
    fn test_standard_registry_covers_supported_formats() {
        let registry = ExtractorRegistry::standard(Arc::new(MockOcrEngine {
            text: "ocr".to_string(),
        }));

        for tag in [FormatTag::Pdf, FormatTag::Word, FormatTag::Excel, FormatTag::Image] {
            assert!(registry.supports(tag), "{} should be registered", tag);
            assert_eq!(registry.get(tag).map(|e| e.format()), Some(tag));
        }
        assert!(!registry.supports(FormatTag::Unsupported));
    }

    #[test]
    fn test_register_replaces_existing_extractor() {
        let registry = ExtractorRegistry::new()
            .with(Arc::new(ImageExtractor::new(Arc::new(MockOcrEngine {
                text: "first".to_string(),
            }))))
            .with(Arc::new(ImageExtractor::new(Arc::new(MockOcrEngine {
                text: "second".to_string(),
            }))));

        let extractor = registry.get(FormatTag::Image).unwrap();
        assert_eq!(extractor.extract("a.png", b"x").unwrap(), "second");
    }
}
