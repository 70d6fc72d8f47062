//! Text measurement for the built-in Helvetica faces
//!
//! Advance widths come from the Adobe core-font AFM files, in 1/1000 em,
//! for the printable ASCII range. Anything outside it is measured as a digit.

/// Points to millimetres
pub const MM_PER_PT: f32 = 25.4 / 72.0;

const FALLBACK_WIDTH: u16 = 556;

/// Helvetica, codes 32..=126
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold (and Bold-Oblique, which shares its widths), codes 32..=126
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Normal,
    Bold,
    BoldItalic,
}

fn char_width(c: char, style: FontStyle) -> u16 {
    let table = match style {
        FontStyle::Normal => &HELVETICA,
        FontStyle::Bold | FontStyle::BoldItalic => &HELVETICA_BOLD,
    };
    let code = c as u32;
    if (32..=126).contains(&code) {
        table[(code - 32) as usize]
    } else {
        FALLBACK_WIDTH
    }
}

/// Rendered width of `text` in millimetres
pub fn text_width_mm(text: &str, font_size_pt: f32, style: FontStyle) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, style))).sum();
    units as f32 / 1000.0 * font_size_pt * MM_PER_PT
}

/// Greedy word wrap to `max_width_mm`.
///
/// Words are separated by single spaces in the output; a word wider than the
/// whole line is split across lines by character. Words are never dropped or
/// reordered.
pub fn wrap_text(
    text: &str,
    font_size_pt: f32,
    style: FontStyle,
    max_width_mm: f32,
) -> Vec<String> {
    let fits = |candidate: &str| text_width_mm(candidate, font_size_pt, style) <= max_width_mm;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if fits(&candidate) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if fits(word) {
            current = word.to_string();
            continue;
        }

        for c in word.chars() {
            current.push(c);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
