//! Builders for small in-memory PDFs used by tests across the workspace.

use crate::PdfEngineError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// A string placed on a sample page with `Td` at `(x, y)` in PDF user space
#[derive(Debug, Clone, PartialEq)]
pub struct SampleText {
    pub text: String,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplePage {
    pub width: f32,
    pub height: f32,
    pub texts: Vec<SampleText>,
}

impl SamplePage {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height, texts: Vec::new() }
    }

    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    pub fn with_text(mut self, text: &str, font_size: f32, x: f32, y: f32) -> Self {
        self.texts.push(SampleText { text: text.to_owned(), font_size, x, y });
        self
    }

    fn content(&self) -> Content {
        let mut operations = Vec::new();
        for text in &self.texts {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), text.font_size.into()]));
            operations.push(Operation::new("Td", vec![text.x.into(), text.y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text.text.as_str())]));
            operations.push(Operation::new("ET", vec![]));
        }
        Content { operations }
    }
}

/// Serialize a document with one page per entry.
pub fn sample_pdf(pages: &[SamplePage]) -> Result<Vec<u8>, PdfEngineError> {
    build(pages, None)
}

/// Like [`sample_pdf`], giving the font a `/Widths` table from `first_char`.
pub fn sample_pdf_with_widths(
    pages: &[SamplePage],
    first_char: i64,
    widths: &[f32],
) -> Result<Vec<u8>, PdfEngineError> {
    build(pages, Some((first_char, widths)))
}

fn build(pages: &[SamplePage], widths: Option<(i64, &[f32])>) -> Result<Vec<u8>, PdfEngineError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    };
    if let Some((first_char, widths)) = widths {
        let widths: Vec<Object> = widths.iter().map(|w| Object::Real(*w)).collect();
        let last_char = first_char + widths.len() as i64 - 1;
        font.set("FirstChar", first_char);
        font.set("LastChar", last_char);
        font.set("Widths", widths);
    }
    let font_id = doc.add_object(font);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page.content().encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Blank letter-sized pages
pub fn blank_pdf(page_count: usize) -> Result<Vec<u8>, PdfEngineError> {
    let pages: Vec<SamplePage> = (0..page_count).map(|_| SamplePage::letter()).collect();
    sample_pdf(&pages)
}
