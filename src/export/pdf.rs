//! PDF renderer.
//!
//! Lays the document out as positioned lines on US-letter pages, then draws
//! them with an embedded DejaVu Serif so Latin and Cyrillic Uzbek both survive.
//! Front matter goes on the first page and every chapter starts on a new page.

use super::ExportDocument;
use crate::error::ExportError;
use crate::utils::wrap_text;
use printpdf::{Mm, PdfDocument};

const PAGE_WIDTH_MM: f32 = 215.9;
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 25.4;
const PT_TO_MM: f32 = 0.352_778;

static REGULAR_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSerif.ttf");
static BOLD_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSerif-Bold.ttf");

const TITLE_SIZE: f32 = 32.0;
const AUTHOR_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 20.0;
const BODY_SIZE: f32 = 12.0;

/// A line of text at a fixed position on a page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlacedLine {
    pub text: String,
    pub size: f32,
    pub bold: bool,
    pub x: f32,
    pub y: f32,
}

/// Lines for one page, top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

/// Average DejaVu Serif advance, as a fraction of the font size.
const GLYPH_WIDTH_EM: f32 = 0.55;

fn text_width_mm(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH_EM * PT_TO_MM
}

fn chars_per_line(size: f32) -> usize {
    let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    (usable / (size * GLYPH_WIDTH_EM * PT_TO_MM)) as usize
}

fn line_height_mm(size: f32) -> f32 {
    size * 1.5 * PT_TO_MM
}

struct Layouter {
    pages: Vec<PageLayout>,
    y: f32,
}

impl Layouter {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn skip(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn push(&mut self, text: &str, size: f32, bold: bool, centered: bool) {
        let height = line_height_mm(size);
        if self.y - height < MARGIN_MM {
            self.new_page();
        }
        self.y -= height;

        let x = if centered {
            ((PAGE_WIDTH_MM - text_width_mm(text, size)) / 2.0).max(MARGIN_MM)
        } else {
            MARGIN_MM
        };

        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine {
                text: text.to_string(),
                size,
                bold,
                x,
                y: self.y,
            });
        }
    }

    fn push_wrapped(&mut self, text: &str, size: f32, bold: bool, centered: bool) {
        for line in wrap_text(text, chars_per_line(size)) {
            if line.is_empty() {
                self.skip(line_height_mm(size));
            } else {
                self.push(&line, size, bold, centered);
            }
        }
    }
}

/// Compute page layout for the document.
pub(crate) fn layout(document: &ExportDocument<'_>) -> Vec<PageLayout> {
    let mut layouter = Layouter::new();

    layouter.skip(30.0);
    layouter.push_wrapped(document.title, TITLE_SIZE, true, true);
    layouter.skip(4.0);
    layouter.push_wrapped(document.author, AUTHOR_SIZE, false, true);

    for chapter in &document.chapters {
        layouter.new_page();
        layouter.push_wrapped(chapter.title, HEADING_SIZE, true, false);
        layouter.skip(6.0);
        layouter.push_wrapped(chapter.body, BODY_SIZE, false, false);
    }

    layouter.pages
}

fn render_error(e: impl std::fmt::Debug) -> ExportError {
    ExportError::Render(format!("{:?}", e))
}

/// Render the document as PDF bytes.
pub fn render_pdf(document: &ExportDocument<'_>) -> Result<Vec<u8>, ExportError> {
    let pages = layout(document);

    let (doc, first_page, first_layer) = PdfDocument::new(
        document.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc.add_external_font(REGULAR_FONT).map_err(render_error)?;
    let bold = doc.add_external_font(BOLD_FONT).map_err(render_error)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            let (page_index, layer_index) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            layer = doc.get_page(page_index).get_layer(layer_index);
        }

        for line in &page.lines {
            let font = if line.bold { &bold } else { &regular };
            layer.use_text(line.text.clone(), line.size, Mm(line.x), Mm(line.y), font);
        }
    }

    doc.save_to_bytes().map_err(render_error)
}
