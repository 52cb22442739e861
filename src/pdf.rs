use std::io::BufWriter;

use printpdf::*;

use crate::error::{Result, SleuthError};
use crate::narrative::ReportDocument;
use crate::report::{render_lines, ReportLine, ReportMeta};

// US Letter dimensions (mm)
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN_TOP: f32 = 25.4;
const MARGIN_BOTTOM: f32 = 25.4;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 12.0;
const TITLE_SIZE: f32 = 16.0;
// Helvetica at 10pt fits roughly this many characters across the margins.
const WRAP_COLUMNS: usize = 95;

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SleuthError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| SleuthError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, size: f32, bold: bool) {
        let font = if bold {
            self.font_bold.clone()
        } else {
            self.font.clone()
        };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(MARGIN_LEFT), Mm(self.pdf_y()), &font);
    }

    fn hline(&self) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.pdf_y())), false),
                (Point::new(Mm(PAGE_W - MARGIN_RIGHT), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn line(&mut self, line: &ReportLine) {
        match line {
            ReportLine::Title(s) => {
                self.ensure_space(ROW_H * 2.0);
                self.text(s, TITLE_SIZE, true);
                self.y += 7.0;
            }
            ReportLine::Heading(s) => {
                self.ensure_space(ROW_H * 2.0);
                self.text(s, HEADING_SIZE, true);
                self.y += 6.0;
            }
            ReportLine::Body(s) => {
                for wrapped in textwrap::wrap(s, WRAP_COLUMNS) {
                    self.ensure_space(ROW_H);
                    self.text(&wrapped, FONT_SIZE, false);
                    self.y += ROW_H;
                }
            }
            ReportLine::Rule => {
                self.hline();
                self.y += 3.0;
            }
            ReportLine::Blank => self.y += ROW_H,
        }
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| SleuthError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| SleuthError::Pdf(e.to_string()))
    }
}

/// Lay out the same lines as the text export on US Letter pages.
pub fn render_report(doc: &ReportDocument, meta: &ReportMeta) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(&doc.title)?;
    for line in render_lines(doc, meta) {
        pdf.line(&line);
    }
    pdf.to_bytes()
}
