//! Spreadsheet extraction: xlsx/xls/ods through calamine, csv passthrough

use super::{ExtractionError, TextExtractor};
use crate::models::FormatTag;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Sheet name used for single-sheet csv input
const CSV_SHEET_NAME: &str = "Sheet1";

/// Emits `=== <sheet> ===` followed by the sheet as CSV for every worksheet,
/// in the workbook's declared order
pub struct ExcelExtractor;

impl ExcelExtractor {
    pub fn new() -> Self {
        Self
    }

    fn is_csv(file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn push_sheet(out: &mut String, sheet_name: &str, csv: &str) {
        out.push_str(&format!("=== {} ===\n", sheet_name));
        out.push_str(csv);
        out.push_str("\n\n");
    }

    fn extract_csv(bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::Encoding(format!("CSV is not valid UTF-8: {}", e)))?;
        let text = text.trim_start_matches('\u{feff}').replace("\r\n", "\n");

        let mut out = String::new();
        Self::push_sheet(&mut out, CSV_SHEET_NAME, text.trim_end_matches('\n'));
        Ok(out)
    }

    fn extract_workbook(bytes: &[u8]) -> Result<(String, usize), ExtractionError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| ExtractionError::Spreadsheet(format!("Failed to open workbook: {}", e)))?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let mut out = String::new();

        for sheet_name in &sheet_names {
            let range = workbook.worksheet_range(sheet_name).map_err(|e| {
                let detail = format!("Failed to read sheet '{}': {}", sheet_name, e);
                ExtractionError::Spreadsheet(detail)
            })?;

            let csv = range
                .rows()
                .map(Self::row_to_csv)
                .collect::<Vec<_>>()
                .join("\n");

            Self::push_sheet(&mut out, sheet_name, &csv);
        }

        Ok((out, sheet_names.len()))
    }

    fn row_to_csv(row: &[Data]) -> String {
        row.iter()
            .map(|cell| csv_field(&cell.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for ExcelExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for ExcelExtractor {
    fn format(&self) -> FormatTag {
        FormatTag::Excel
    }

    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        if Self::is_csv(file_name) {
            tracing::debug!("[ExcelExtractor] CSV passthrough: {}", file_name);
            return Self::extract_csv(bytes);
        }

        let (text, sheets) = Self::extract_workbook(bytes)?;

        tracing::info!(
            "[ExcelExtractor] {}: {} sheets, {} chars",
            file_name,
            sheets,
            text.len()
        );

        Ok(text)
    }
}

/// Quote a CSV field when it contains a separator, quote or line break
pub(crate) fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
