//! Image OCR
//!
//! Recognition is fixed to English and a whitelist of alphanumeric and
//! punctuation characters. The default engine drives the `tesseract`
//! executable (stdin -> stdout) so no native library has to be linked.

use super::{ExtractionError, TextExtractor};
use crate::models::FormatTag;
use std::sync::Arc;

/// Recognition language
pub const OCR_LANGUAGE: &str = "eng";

/// Characters tesseract is allowed to emit
pub const OCR_CHAR_WHITELIST: &str = concat!(
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    r#".,;:!?@#$%^&*()-_=+[]{}|\'"<>/`~ "#,
);

/// OCR backend
pub trait OcrEngine: Send + Sync {
    /// Recognize text in an encoded image (png, jpeg, ...)
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Runs the tesseract command line tool
pub struct TesseractCli {
    binary: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments for a stdin -> stdout run with fixed language and whitelist
    fn args() -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            OCR_LANGUAGE.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", OCR_CHAR_WHITELIST),
        ]
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let output = duct::cmd(self.binary.as_str(), Self::args())
            .stdin_bytes(image_bytes.to_vec())
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| {
                ExtractionError::OcrUnavailable(format!("failed to run {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::OcrProcessing(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| ExtractionError::Encoding(format!("OCR output is not UTF-8: {}", e)))
    }
}

/// Image extractor over any `OcrEngine`
pub struct ImageExtractor {
    engine: Arc<dyn OcrEngine>,
}

impl ImageExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self { engine }
    }
}

impl TextExtractor for ImageExtractor {
    fn format(&self) -> FormatTag {
        FormatTag::Image
    }

    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        tracing::debug!("[ImageExtractor] OCR on {} ({} bytes)", file_name, bytes.len());

        // Recognized text is returned verbatim
        let text = self.engine.recognize(bytes)?;

        tracing::info!("[ImageExtractor] {}: {} chars recognized", file_name, text.len());
        Ok(text)
    }
}

/// Fixed-output OCR engine for unit tests
#[cfg(test)]
pub(crate) struct MockOcrEngine {
    pub text: String,
}

#[cfg(test)]
impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_fix_language_and_whitelist() {
        let args = TesseractCli::args();
        assert_eq!(&args[..4], &["stdin", "stdout", "-l", "eng"]);
        assert!(args[5].starts_with("tessedit_char_whitelist=0123456789"));
        assert!(args[5].ends_with("`~ "));
    }

    #[test]
    fn test_whitelist_has_no_duplicates() {
        let mut chars: Vec<char> = OCR_CHAR_WHITELIST.chars().collect();
        let total = chars.len();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), total);
    }

    #[test]
    fn test_text_is_returned_verbatim() {
        let extractor = ImageExtractor::new(Arc::new(MockOcrEngine {
            text: "  Rated 24V, 3A \n".to_string(),
        }));
        let text = extractor.extract("label.png", b"img").unwrap();
        assert_eq!(text, "  Rated 24V, 3A \n");
    }

    #[test]
    fn test_missing_binary_reports_unavailable() {
        let engine = TesseractCli::new("/nonexistent/reqflow-tesseract");
        let err = engine.recognize(b"img").unwrap_err();
        assert!(matches!(err, ExtractionError::OcrUnavailable(_)));
    }
}
