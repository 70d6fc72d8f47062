//! Block segmentation and pagination
//!
//! Structured text is split on blank lines into blocks. A line starting with
//! one to four `#` and a space is a heading (marker stripped); other lines
//! are body text wrapped to the printable width. A cursor walks down each
//! page and a new page starts whenever the next line would cross the bottom
//! margin.

use super::metrics::{wrap_text, FontStyle};
use super::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One positioned line of text. `x`/`y` are millimetres from the top-left
/// corner; `y` is the baseline. For centered runs `x` is the page center.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub style: FontStyle,
    pub align: Align,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedDocument {
    pub pages: Vec<Page>,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All run texts in reading order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.runs.iter().map(|r| r.text.as_str()))
    }
}

/// Typography of one block kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub font_size: f32,
    pub style: FontStyle,
    /// Cursor advance per emitted line, mm
    pub advance: f32,
    /// Left edge, mm; ignored for centered blocks
    pub x: f32,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub page_width: f32,
    pub page_height: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub left_margin: f32,
    /// Space added after every block, mm
    pub block_spacing: f32,
    /// Headings of level 1..=4
    pub headings: [BlockStyle; 4],
    pub body: BlockStyle,
    /// Centered bold title above the first block of page one
    pub header_title: Option<String>,
    /// Append a `Source Files` page listing every input
    pub source_appendix: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let heading = |font_size, style, advance, x, align| BlockStyle {
            font_size,
            style,
            advance,
            x,
            align,
        };
        Self {
            page_width: 210.0,
            page_height: 297.0,
            top_margin: 20.0,
            bottom_margin: 20.0,
            left_margin: 15.0,
            block_spacing: 4.0,
            headings: [
                heading(16.0, FontStyle::Bold, 12.0, 15.0, Align::Center),
                heading(14.0, FontStyle::Bold, 10.0, 15.0, Align::Left),
                heading(12.0, FontStyle::Bold, 8.0, 20.0, Align::Left),
                heading(11.0, FontStyle::BoldItalic, 7.0, 20.0, Align::Left),
            ],
            body: heading(11.0, FontStyle::Normal, 6.0, 15.0, Align::Left),
            header_title: None,
            source_appendix: false,
        }
    }
}

impl RenderOptions {
    /// Width available to text between the side margins
    pub fn printable_width(&self) -> f32 {
        self.page_width - 2.0 * self.left_margin
    }

    /// Lowest baseline a line may occupy
    pub fn content_bottom(&self) -> f32 {
        self.page_height - self.bottom_margin
    }

    pub(crate) fn validate(&self) -> Result<(), RenderError> {
        let tallest = self
            .headings
            .iter()
            .chain(std::iter::once(&self.body))
            .map(|s| s.advance)
            .fold(0.0_f32, f32::max);

        if self.printable_width() <= 0.0 {
            return Err(RenderError::InvalidGeometry(format!(
                "side margins of {}mm leave no room on a {}mm page",
                self.left_margin, self.page_width
            )));
        }
        if self.top_margin + tallest > self.content_bottom() {
            return Err(RenderError::InvalidGeometry(format!(
                "a {}mm line does not fit between the margins",
                tallest
            )));
        }
        Ok(())
    }
}

/// A segmented piece of structured text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: usize, text: String },
    Body(Vec<String>),
}

/// Heading level and marker-free text, if `line` is a level 1-4 heading
fn heading_of(line: &str) -> Option<(usize, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if !(1..=4).contains(&hashes) {
        return None;
    }
    line[hashes..]
        .strip_prefix(' ')
        .map(|rest| (hashes, rest.trim()))
}

/// Split on blank lines; heading lines inside a block become their own block
pub fn segment(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut body: Vec<String> = Vec::new();

    let flush = |body: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if !body.is_empty() {
            blocks.push(Block::Body(std::mem::take(body)));
        }
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut body, &mut blocks);
            continue;
        }
        match heading_of(line) {
            Some((level, heading)) => {
                flush(&mut body, &mut blocks);
                blocks.push(Block::Heading {
                    level,
                    text: heading.to_string(),
                });
            }
            None => body.push(line.to_string()),
        }
    }
    flush(&mut body, &mut blocks);

    blocks
}

/// Walks pages top to bottom, emitting runs
struct Cursor<'a> {
    options: &'a RenderOptions,
    pages: Vec<Page>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            pages: vec![Page::default()],
            y: options.top_margin,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.options.top_margin;
    }

    /// Break the page when a line of `advance` would cross the bottom margin
    fn ensure_room(&mut self, advance: f32) {
        if self.y + advance > self.options.content_bottom() {
            self.new_page();
        }
    }

    fn emit_line(&mut self, text: String, style: &BlockStyle) {
        self.ensure_room(style.advance);
        let x = match style.align {
            Align::Center => self.options.page_width / 2.0,
            Align::Left => style.x,
        };
        let run = TextRun {
            text,
            x,
            y: self.y,
            font_size: style.font_size,
            style: style.style,
            align: style.align,
        };
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(run);
        }
        self.y += style.advance;
    }

    fn emit_wrapped(&mut self, text: &str, style: &BlockStyle) {
        let width = match style.align {
            Align::Center => self.options.printable_width(),
            Align::Left => self.options.page_width - self.options.left_margin - style.x,
        };
        for line in wrap_text(text, style.font_size, style.style, width) {
            self.emit_line(line, style);
        }
    }

    fn end_block(&mut self) {
        self.y += self.options.block_spacing;
    }
}

/// Lay out structured text (and an optional source list) into pages
pub fn layout(
    text: &str,
    sources: &[String],
    options: &RenderOptions,
) -> Result<RenderedDocument, RenderError> {
    if text.trim().is_empty() {
        return Err(RenderError::EmptyInput);
    }
    options.validate()?;

    let mut cursor = Cursor::new(options);

    if let Some(title) = options.header_title.as_deref().filter(|t| !t.trim().is_empty()) {
        let run = TextRun {
            text: title.trim().to_string(),
            x: options.page_width / 2.0,
            y: options.top_margin - 5.0,
            font_size: 16.0,
            style: FontStyle::Bold,
            align: Align::Center,
        };
        cursor.pages[0].runs.push(run);
    }

    for block in segment(text) {
        match block {
            Block::Heading { level, text } => {
                let style = options.headings[level - 1];
                cursor.emit_wrapped(&text, &style);
            }
            Block::Body(lines) => {
                let style = options.body;
                for line in &lines {
                    cursor.emit_wrapped(line, &style);
                }
            }
        }
        cursor.end_block();
    }

    if options.source_appendix && !sources.is_empty() {
        cursor.new_page();
        let heading = options.headings[1];
        cursor.emit_line("Source Files".to_string(), &heading);
        let entry = BlockStyle {
            x: options.headings[2].x,
            ..options.body
        };
        for source in sources {
            cursor.emit_wrapped(source, &entry);
        }
    }

    Ok(RenderedDocument {
        pages: cursor.pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::metrics::text_width_mm;

    fn body_words(doc: &RenderedDocument) -> Vec<String> {
        doc.pages
            .iter()
            .flat_map(|p| p.runs.iter())
            .filter(|r| r.style == FontStyle::Normal)
            .flat_map(|r| r.text.split_whitespace().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_segment_classifies_headings_and_bodies() {
        let blocks = segment(
            "# Title\n\n## Scope\nFirst line\nsecond line\n\n#### Note\n\n##### five\n\n#nospace",
        );
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
                Block::Heading {
                    level: 2,
                    text: "Scope".into()
                },
                Block::Body(vec!["First line".into(), "second line".into()]),
                Block::Heading {
                    level: 4,
                    text: "Note".into()
                },
                Block::Body(vec!["##### five".into()]),
                Block::Body(vec!["#nospace".into()]),
            ]
        );
    }

    #[test]
    fn test_whitespace_only_lines_separate_blocks() {
        let blocks = segment("one\n   \t\ntwo");
        assert_eq!(
            blocks,
            vec![Block::Body(vec!["one".into()]), Block::Body(vec!["two".into()])]
        );
    }

    #[test]
    fn test_title_then_wrapped_body() {
        let body = "Some body words repeated many times ".repeat(20);
        let text = format!("# Title\n\n{}", body);
        let options = RenderOptions::default();

        let doc = layout(&text, &[], &options).unwrap();
        let page = &doc.pages[0];

        let title = &page.runs[0];
        assert_eq!(title.text, "Title");
        assert_eq!(title.align, Align::Center);
        assert_eq!(title.style, FontStyle::Bold);
        assert_eq!(title.font_size, 16.0);
        assert_eq!(title.x, 105.0);

        let body_runs: Vec<_> = page.runs[1..].iter().collect();
        assert!(body_runs.len() > 1);
        for run in &body_runs {
            assert_eq!(run.align, Align::Left);
            assert_eq!(run.x, 15.0);
            assert!(run.x + text_width_mm(&run.text, run.font_size, run.style) <= 195.0 + 1e-3);
        }
        let expected: Vec<String> = body.split_whitespace().map(str::to_string).collect();
        assert_eq!(body_words(&doc), expected);
    }

    #[test]
    fn test_paragraph_continues_on_next_page() {
        let words: Vec<String> = (0..1200).map(|i| format!("word{}", i)).collect();
        let text = words.join(" ");
        let options = RenderOptions::default();

        let doc = layout(&text, &[], &options).unwrap();

        assert!(doc.page_count() >= 2);
        let second = &doc.pages[1].runs[0];
        assert_eq!(second.y, options.top_margin);
        assert_eq!(second.style, FontStyle::Normal);
        assert_eq!(body_words(&doc), words);
    }

    #[test]
    fn test_no_line_crosses_bottom_margin() {
        let mut text = String::new();
        for i in 0..40 {
            text.push_str(&format!(
                "## Section {}\n\n### Part\n\n#### Detail\n\n{}\n\n",
                i,
                "lorem ipsum dolor sit amet ".repeat(12)
            ));
        }
        let options = RenderOptions::default();

        let doc = layout(&text, &[], &options).unwrap();

        assert!(doc.page_count() > 3);
        for page in &doc.pages {
            assert!(!page.runs.is_empty());
            for run in &page.runs {
                assert!(run.y >= options.top_margin);
                assert!(run.y <= options.content_bottom(), "{} at {}", run.text, run.y);
            }
        }
    }

    #[test]
    fn test_page_breaks_exactly_when_next_line_would_overflow() {
        let options = RenderOptions::default();
        let lines: Vec<String> = (0..60).map(|i| format!("line{}", i)).collect();
        let doc = layout(&lines.join("\n"), &[], &options).unwrap();

        // 20 + 6n + 6 <= 277 holds for n <= 41
        assert_eq!(doc.pages[0].runs.len(), 42);
        assert_eq!(doc.pages[0].runs[41].y, 20.0 + 6.0 * 41.0);
        assert_eq!(doc.pages[1].runs[0].text, "line42");
    }

    #[test]
    fn test_heading_markers_never_rendered() {
        let text = "# One\n\n## Two\n\n### Three\n\n#### Four\n\nbody";
        let doc = layout(text, &[], &RenderOptions::default()).unwrap();

        let texts: Vec<&str> = doc.texts().collect();
        assert_eq!(texts, vec!["One", "Two", "Three", "Four", "body"]);

        let runs = &doc.pages[0].runs;
        assert_eq!((runs[1].x, runs[1].font_size), (15.0, 14.0));
        assert_eq!((runs[2].x, runs[2].font_size), (20.0, 12.0));
        assert_eq!(runs[3].x, runs[2].x);
        assert_eq!(runs[3].style, FontStyle::BoldItalic);
    }

    #[test]
    fn test_block_spacing_between_blocks() {
        let doc = layout("first\n\nsecond", &[], &RenderOptions::default()).unwrap();
        let runs = &doc.pages[0].runs;
        assert_eq!(runs[0].y, 20.0);
        assert_eq!(runs[1].y, 20.0 + 6.0 + 4.0);
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(
            layout(" \n\n\t", &[], &RenderOptions::default()),
            Err(RenderError::EmptyInput)
        ));
    }

    #[test]
    fn test_impossible_geometry_is_error() {
        let options = RenderOptions {
            page_height: 30.0,
            ..RenderOptions::default()
        };
        assert!(matches!(
            layout("text", &[], &options),
            Err(RenderError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_header_title_and_source_appendix() {
        let options = RenderOptions {
            header_title: Some("Engineering Automation Document".to_string()),
            source_appendix: true,
            ..RenderOptions::default()
        };
        let sources = vec!["design.pdf (PDF)".to_string(), "label.png (Image)".to_string()];

        let doc = layout("# Title", &sources, &options).unwrap();

        assert_eq!(doc.pages[0].runs[0].text, "Engineering Automation Document");
        assert_eq!(doc.pages[0].runs[0].y, 15.0);
        let appendix = doc.pages.last().unwrap();
        let texts: Vec<&str> = appendix.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Source Files", "design.pdf (PDF)", "label.png (Image)"]);
        assert_eq!(appendix.runs[1].x, 20.0);
    }
}
