//! Pipeline data types
//!
//! Every stage hands the next one an immutable snapshot:
//! `SourceFile` -> `ExtractionResult` (in a `Corpus`) -> `StructuringOutcome`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Prefix carried by the text of every failed extraction
pub const ERROR_SENTINEL_PREFIX: &str = "ERROR:";

/// An input file as handed over by the caller
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name including extension
    pub name: String,
    /// Byte length of the content
    pub size: u64,
    /// Last-modified timestamp
    pub last_modified: DateTime<Utc>,
    /// Raw content, shared with extraction tasks without copying
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Build an in-memory source file stamped with the current time
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            last_modified: Utc::now(),
            bytes: Arc::from(bytes),
        }
    }

    /// Override the last-modified timestamp
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Read a file from disk
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let metadata = tokio::fs::metadata(path).await?;

        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size: bytes.len() as u64,
            last_modified,
            bytes: Arc::from(bytes),
        })
    }

    /// Identity used to drop repeated picks of the same file
    pub fn identity(&self) -> (&str, u64, DateTime<Utc>) {
        (&self.name, self.size, self.last_modified)
    }
}

/// Format category derived from a file name's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    #[serde(rename = "PDF")]
    Pdf,
    Word,
    Excel,
    Image,
    Unsupported,
}

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Word => "Word",
            Self::Excel => "Excel",
            Self::Image => "Image",
            Self::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of extracting one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub source_file_name: String,
    pub format_tag: FormatTag,
    /// Extracted text, or the `ERROR:` sentinel on failure. Never empty.
    pub text: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ExtractionResult {
    pub fn succeeded(file_name: &str, format_tag: FormatTag, text: String) -> Self {
        Self {
            source_file_name: file_name.to_string(),
            format_tag,
            text,
            success: true,
            error_detail: None,
        }
    }

    pub fn failed(file_name: &str, format_tag: FormatTag, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            source_file_name: file_name.to_string(),
            format_tag,
            text: format!(
                "{} Failed to extract {} content - {}",
                ERROR_SENTINEL_PREFIX, format_tag, detail
            ),
            success: false,
            error_detail: Some(detail),
        }
    }
}

/// Extraction results in input file order
pub type Corpus = Vec<ExtractionResult>;

/// Which link of the provider chain produced the structured text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Remote generative-text endpoint (Gemini)
    ProviderA,
    /// Remote chat-completion endpoint (OpenAI)
    ProviderB,
    /// Deterministic offline formatter
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderA => "gemini",
            Self::ProviderB => "openai",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final structured text of one structuring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuringOutcome {
    pub text: String,
    pub source_provider: ProviderKind,
}
