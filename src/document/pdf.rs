//! PDF output built directly on `lopdf`.
//!
//! Layout is a simple top-down flow on A4 pages using the standard Helvetica faces, so no
//! font files are embedded. Text is reduced to ASCII first; the standard fonts cannot show
//! anything else.

use super::{answer_paragraphs, clean_text, group_by_article, wrap_text, DocumentBuilder, DOCUMENT_TITLE};
use crate::error::DocumentError;
use crate::types::article_data::QaRecord;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const BODY_TOP: f32 = PAGE_HEIGHT - 80.0;
const BODY_BOTTOM: f32 = 60.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const ITALIC: &str = "F3";
const BOLD_ITALIC: &str = "F4";

type Rgb = (f32, f32, f32);
const BLACK: Rgb = (0.0, 0.0, 0.0);
const GRAY: Rgb = (0.5, 0.5, 0.5);
const NAVY: Rgb = (0.0, 0.0, 0.5);
const BLUE: Rgb = (0.0, 0.4, 0.8);

#[derive(Debug, Clone)]
pub struct PdfDocument {
    /// Wrap column for questions and answers.
    pub wrap_width: usize,
}

impl Default for PdfDocument {
    fn default() -> Self {
        PdfDocument { wrap_width: 80 }
    }
}

/// Accumulates drawing operations page by page.
struct PageFlow {
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl PageFlow {
    fn new() -> Self {
        PageFlow {
            pages: vec![Vec::new()],
            y: BODY_TOP,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = BODY_TOP;
    }

    fn current(&mut self) -> &mut Vec<Operation> {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < BODY_BOTTOM {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn text(&mut self, font: &str, size: f32, color: Rgb, text: &str) {
        let leading = size + 4.0;
        self.ensure(leading);
        self.y -= leading;
        let y = self.y;
        let ops = text_ops(font, size, color, MARGIN, y, text);
        self.current().extend(ops);
    }

    fn rule(&mut self, color: Rgb, dashed: bool) {
        self.ensure(10.0);
        self.y -= 5.0;
        let y = self.y;
        let ops = rule_ops(color, dashed, MARGIN, PAGE_WIDTH - MARGIN, y);
        self.current().extend(ops);
        self.y -= 5.0;
    }
}

fn text_ops(font: &str, size: f32, color: Rgb, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("rg", vec![color.0.into(), color.1.into(), color.2.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn rule_ops(color: Rgb, dashed: bool, x1: f32, x2: f32, y: f32) -> Vec<Operation> {
    let dash: Vec<Object> = if dashed { vec![2.into(), 2.into()] } else { vec![] };
    vec![
        Operation::new("q", vec![]),
        Operation::new("RG", vec![color.0.into(), color.1.into(), color.2.into()]),
        Operation::new("w", vec![0.5f32.into()]),
        Operation::new("d", vec![Object::Array(dash), 0.into()]),
        Operation::new("m", vec![x1.into(), y.into()]),
        Operation::new("l", vec![x2.into(), y.into()]),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// X offset centering `text` on the page, using an average Helvetica glyph width.
fn centered_x(text: &str, size: f32) -> f32 {
    let width = text.len() as f32 * size * 0.5;
    ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
}

fn header_ops() -> Vec<Operation> {
    let mut ops = text_ops(BOLD, 12.0, BLACK, centered_x(DOCUMENT_TITLE, 12.0), PAGE_HEIGHT - 40.0, DOCUMENT_TITLE);
    ops.extend(rule_ops(BLACK, false, MARGIN, PAGE_WIDTH - MARGIN, PAGE_HEIGHT - 52.0));
    ops
}

fn footer_ops(page_no: usize) -> Vec<Operation> {
    let label = format!("Page {}", page_no);
    text_ops(ITALIC, 8.0, GRAY, centered_x(&label, 8.0), 30.0, &label)
}

impl PdfDocument {
    fn layout(&self, records: &[QaRecord]) -> PageFlow {
        let mut flow = PageFlow::new();

        for (index, section) in group_by_article(records).into_iter().enumerate() {
            if index > 0 {
                flow.new_page();
            }
            for line in wrap_text(&clean_text(section.title), self.wrap_width * 3 / 4) {
                flow.text(BOLD, 14.0, NAVY, &line);
            }
            flow.text(ITALIC, 10.0, GRAY, &format!("Date: {}", clean_text(section.date)));
            flow.text(ITALIC, 10.0, GRAY, &format!("Source: {}", clean_text(section.url)));
            flow.gap(5.0);
            flow.rule(BLACK, false);
            flow.gap(10.0);

            for record in &section.records {
                let question = format!("Q: {}", clean_text(&record.question));
                for line in wrap_text(&question, self.wrap_width) {
                    flow.text(BOLD_ITALIC, 12.0, BLACK, &line);
                }
                flow.gap(3.0);
                flow.text(BOLD, 11.0, BLUE, &format!("{}:", clean_text(&record.speaker)));

                let paragraphs = answer_paragraphs(&clean_text(&record.answer));
                for (i, paragraph) in paragraphs.iter().enumerate() {
                    for line in wrap_text(paragraph, self.wrap_width) {
                        flow.text(REGULAR, 11.0, BLACK, &line);
                    }
                    if i + 1 < paragraphs.len() {
                        flow.gap(3.0);
                    }
                }
                flow.gap(10.0);
                flow.rule((0.8, 0.8, 0.8), true);
                flow.gap(10.0);
            }
        }
        flow
    }

    /// The finished document, not yet written anywhere.
    pub fn render(&self, records: &[QaRecord]) -> Result<Document, DocumentError> {
        if records.is_empty() {
            return Err(DocumentError::Empty);
        }
        let flow = self.layout(records);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = lopdf::Dictionary::new();
        for (name, base) in [
            (REGULAR, "Helvetica"),
            (BOLD, "Helvetica-Bold"),
            (ITALIC, "Helvetica-Oblique"),
            (BOLD_ITALIC, "Helvetica-BoldOblique"),
        ] {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(name, font_id);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(flow.pages.len());
        for (index, body) in flow.pages.into_iter().enumerate() {
            let mut operations = header_ops();
            operations.extend(body);
            operations.extend(footer_ops(index + 1));

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();
        Ok(doc)
    }
}

impl DocumentBuilder for PdfDocument {
    fn build(&self, records: &[QaRecord], path: &Path) -> Result<(), DocumentError> {
        let mut doc = self.render(records)?;
        doc.save(path)?;
        tracing::info!(path = %path.display(), records = records.len(), "wrote PDF document");
        Ok(())
    }
}
