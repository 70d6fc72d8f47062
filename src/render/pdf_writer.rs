//! Serializes a laid-out document with `printpdf`
//!
//! Layout works top-down in millimetres; PDF user space grows upwards, so
//! every baseline is flipped against the page height.

use super::layout::{Align, RenderedDocument, RenderOptions};
use super::metrics::{text_width_mm, FontStyle};
use super::RenderError;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use std::io::BufWriter;

struct Fonts {
    normal: IndirectFontRef,
    bold: IndirectFontRef,
    bold_italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, RenderError> {
        let font = |builtin| {
            doc.add_builtin_font(builtin)
                .map_err(|e| RenderError::Pdf(format!("font error: {e}")))
        };
        Ok(Self {
            normal: font(BuiltinFont::Helvetica)?,
            bold: font(BuiltinFont::HelveticaBold)?,
            bold_italic: font(BuiltinFont::HelveticaBoldOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Normal => &self.normal,
            FontStyle::Bold => &self.bold,
            FontStyle::BoldItalic => &self.bold_italic,
        }
    }
}

/// Write every page into an in-memory PDF
pub fn write_pdf(
    document: &RenderedDocument,
    options: &RenderOptions,
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    let width = Mm(options.page_width);
    let height = Mm(options.page_height);

    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let fonts = Fonts::load(&doc)?;

    for (index, page) in document.pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        for run in &page.runs {
            let x = match run.align {
                Align::Left => run.x,
                Align::Center => run.x - text_width_mm(&run.text, run.font_size, run.style) / 2.0,
            };
            let y = options.page_height - run.y;
            layer.use_text(run.text.as_str(), run.font_size, Mm(x), Mm(y), fonts.get(run.style));
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RenderError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| RenderError::Pdf(format!("buffer error: {e}")))
}
