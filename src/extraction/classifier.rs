//! Extension-based format classification and batch intake

use crate::models::{FormatTag, SourceFile};
use std::collections::HashSet;

/// Map a file name to its format category using the trailing extension
pub fn classify(file_name: &str) -> FormatTag {
    let ext = match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return FormatTag::Unsupported,
    };

    match ext.as_str() {
        "pdf" => FormatTag::Pdf,
        "doc" | "docx" => FormatTag::Word,
        "xls" | "xlsx" | "csv" => FormatTag::Excel,
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" => FormatTag::Image,
        _ => FormatTag::Unsupported,
    }
}

/// Check if a file name maps to a supported format
pub fn is_supported(file_name: &str) -> bool {
    classify(file_name) != FormatTag::Unsupported
}

/// Why an input was dropped before extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedFormat,
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub name: String,
    pub reason: RejectReason,
}

/// Files accepted for extraction, tagged, in input order
#[derive(Debug, Clone, Default)]
pub struct Intake {
    pub accepted: Vec<(SourceFile, FormatTag)>,
    pub rejected: Vec<RejectedFile>,
}

impl Intake {
    pub fn unsupported_count(&self) -> usize {
        self.rejected
            .iter()
            .filter(|r| r.reason == RejectReason::UnsupportedFormat)
            .count()
    }
}

/// Tag every file, dropping unsupported formats and repeated picks of the same
/// file (same name, size and modification time). First occurrence wins.
pub fn intake(files: Vec<SourceFile>) -> Intake {
    let mut seen = HashSet::new();
    let mut result = Intake::default();

    for file in files {
        let tag = classify(&file.name);
        if tag == FormatTag::Unsupported {
            tracing::debug!("[Intake] Dropping unsupported file: {}", file.name);
            result.rejected.push(RejectedFile {
                name: file.name,
                reason: RejectReason::UnsupportedFormat,
            });
            continue;
        }

        let (name, size, modified) = file.identity();
        if !seen.insert((name.to_string(), size, modified)) {
            tracing::debug!("[Intake] Dropping duplicate file: {}", file.name);
            result.rejected.push(RejectedFile {
                name: file.name,
                reason: RejectReason::Duplicate,
            });
            continue;
        }

        result.accepted.push((file, tag));
    }

    if !result.rejected.is_empty() {
        tracing::warn!(
            "[Intake] {} file(s) ignored ({} unsupported)",
            result.rejected.len(),
            result.unsupported_count()
        );
    }

    result
}
