use crate::models::ExtractionResult;

/// Opening line of the structuring prompt
pub const STRUCTURING_PREAMBLE: &str = "Transform this content into a structured document:";

/// Formatting instructions appended after the raw content
pub const STRUCTURING_FORMAT_RULES: &str = r#"Format with:
- Markdown-style headings (#, ##, ###)
- Proper headings
- Technical sections
- Consistent terminology"#;

/// One `=== <Tag> File: <name> ===` block per corpus entry, blank-line separated.
/// Failed entries keep their `ERROR:` text so the model sees what is missing.
pub fn build_corpus_blocks(corpus: &[ExtractionResult]) -> String {
    corpus
        .iter()
        .map(|entry| {
            format!(
                "=== {} File: {} ===\n{}",
                entry.format_tag, entry.source_file_name, entry.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the single prompt sent to every remote provider
pub fn build_structuring_prompt(specification: &str, corpus: &[ExtractionResult]) -> String {
    format!(
        "{}\n\nDocument Specifications:\n{}\n\nRaw Content:\n{}\n\n{}",
        STRUCTURING_PREAMBLE,
        specification,
        build_corpus_blocks(corpus),
        STRUCTURING_FORMAT_RULES
    )
}
