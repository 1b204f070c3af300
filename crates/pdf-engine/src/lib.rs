//! PDF engine abstraction
//!
//! Opens documents, reports page geometry, rasterizes pages and extracts
//! positioned text for the canvas editor. The default backend is built on
//! lopdf; it parses structure and text but does not paint page content.

use image::{ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

mod text;
mod viewport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use text::{
    extract_text_items, extract_text_items_with_fonts, FontMetrics, FontTable, TextItem,
};
pub use viewport::{Matrix, Rotation, Viewport};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// US Letter, used when a page carries no usable MediaBox
const FALLBACK_PAGE_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// MediaBox lookups give up after this many `Parent` hops
const MAX_INHERITANCE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Zero-based page index
    pub page_index: u32,
    pub scale: f32,
    pub rotation: Rotation,
    pub clip: Option<ClipRect>,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self { page_index: 0, scale: 1.0, rotation: Rotation::Deg0, clip: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width_px: u32,
    pub height_px: u32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self { width_px: 256, height_px: 256 }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported in the default backend")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError>;
    fn viewport(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
        rotation: Rotation,
    ) -> Result<Viewport, PdfEngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn text_content(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<Vec<TextItem>, PdfEngineError>;
    fn render_thumbnail(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        target: ThumbnailSize,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    document: Document,
    page_ids: Vec<ObjectId>,
    page_boxes: Vec<[f32; 4]>,
}

impl DocumentRecord {
    fn page(&self, page_index: u32) -> Result<(ObjectId, [f32; 4]), PdfEngineError> {
        let index = page_index as usize;
        match (self.page_ids.get(index), self.page_boxes.get(index)) {
            (Some(id), Some(page_box)) => Ok((*id, *page_box)),
            _ => Err(PdfEngineError::PageOutOfRange {
                page: page_index,
                page_count: self.page_ids.len() as u32,
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse(bytes: &[u8]) -> Result<DocumentRecord, PdfEngineError> {
        if bytes.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let document = Document::load_mem(bytes)?;
        let pages = document.get_pages();
        let mut page_ids = Vec::with_capacity(pages.len());
        let mut page_boxes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            page_boxes.push(media_box(&document, object_id).unwrap_or(FALLBACK_PAGE_BOX));
            page_ids.push(object_id);
        }

        if page_ids.is_empty() {
            return Err(PdfEngineError::Backend("document has no pages".to_owned()));
        }

        Ok(DocumentRecord { document, page_ids, page_boxes })
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        self.docs.get(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

/// Resolve the page's MediaBox, following `Parent` links for inherited boxes
fn media_box(document: &Document, page_id: ObjectId) -> Option<[f32; 4]> {
    let mut current = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = document.get_dictionary(current).ok()?;
        if let Some(array) = dict.get(b"MediaBox").ok().and_then(|obj| resolve_array(document, obj))
        {
            if array.len() != 4 {
                return None;
            }
            let x0 = array[0].as_float().ok()?;
            let y0 = array[1].as_float().ok()?;
            let x1 = array[2].as_float().ok()?;
            let y1 = array[3].as_float().ok()?;
            return Some([x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn resolve_array<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Vec<Object>> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok()?.as_array().ok(),
        other => other.as_array().ok(),
    }
}

fn resolve_dict<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match object {
        Object::Reference(id) => document.get_dictionary(*id).ok(),
        other => other.as_dict().ok(),
    }
}

/// Look up `key` on the page or the nearest ancestor that defines it
fn inherited<'a>(document: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = document.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Width tables of the page's simple fonts. Fonts without `/Widths` are skipped.
fn page_fonts(document: &Document, page_id: ObjectId) -> FontTable {
    let mut fonts = FontTable::new();
    let Some(font_dict) = inherited(document, page_id, b"Resources")
        .and_then(|resources| resolve_dict(document, resources))
        .and_then(|resources| resources.get(b"Font").ok())
        .and_then(|font| resolve_dict(document, font))
    else {
        return fonts;
    };

    for (name, font) in font_dict.iter() {
        let Some(font) = resolve_dict(document, font) else {
            continue;
        };
        let Some(widths) = font.get(b"Widths").ok().and_then(|w| resolve_array(document, w))
        else {
            continue;
        };
        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .map_or(0, |c| c.max(0) as u32);
        let missing_width = font
            .get(b"FontDescriptor")
            .ok()
            .and_then(|d| resolve_dict(document, d))
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|o| o.as_float().ok())
            .unwrap_or(0.0);
        let widths = widths.iter().map(|w| w.as_float().unwrap_or(0.0)).collect();
        fonts.insert(name.clone(), FontMetrics { first_char, widths, missing_width });
    }
    fonts
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let record = Self::parse(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        tracing::debug!(handle = handle.raw(), pages = record.page_ids.len(), "opened PDF");
        self.docs.insert(handle, record);

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.record(handle)?.page_ids.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let (_, [x0, y0, x1, y1]) = self.record(handle)?.page(page_index)?;
        Ok(PageSize { width_pt: x1 - x0, height_pt: y1 - y0 })
    }

    fn viewport(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        scale: f32,
        rotation: Rotation,
    ) -> Result<Viewport, PdfEngineError> {
        let (_, page_box) = self.record(handle)?.page(page_index)?;
        let scale = if scale <= 0.0 { 1.0 } else { scale };
        Ok(Viewport::new(page_box, scale, rotation))
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let viewport =
            self.viewport(handle, request.page_index, request.scale, request.rotation)?;
        let (mut width, mut height) = viewport.pixel_size();

        if let Some(clip) = request.clip {
            width = (clip.width * viewport.scale).round().max(1.0) as u32;
            height = (clip.height * viewport.scale).round().max(1.0) as u32;
        }

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        Ok(image)
    }

    fn text_content(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<Vec<TextItem>, PdfEngineError> {
        let record = self.record(handle)?;
        let (page_id, _) = record.page(page_index)?;
        let content = record.document.get_page_content(page_id)?;
        let fonts = page_fonts(&record.document, page_id);
        Ok(extract_text_items_with_fonts(&content, &fonts)?)
    }

    fn render_thumbnail(
        &self,
        handle: DocumentHandle,
        page_index: u32,
        target: ThumbnailSize,
    ) -> Result<RgbaImage, PdfEngineError> {
        let page = self.render_page(
            handle,
            RenderRequest { page_index, scale: 0.25, ..RenderRequest::default() },
        )?;

        Ok(image::imageops::thumbnail(&page, target.width_px.max(1), target.height_px.max(1)))
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}
