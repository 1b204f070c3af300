//! Page rendering and render ordering
//!
//! Every render request is stamped with a monotonically increasing token.
//! Only the result for the newest token may land on the canvas; results
//! that arrive after a newer request was issued are stale.

use pdf_engine::{DocumentHandle, PdfEngine, RenderRequest, RgbaImage, Rotation};

use crate::error::{EditorError, EditorResult};
use crate::text_hit::PageText;

/// Parameters of one render request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTicket {
    pub token: u64,
    /// One-based page number
    pub page: u32,
    pub zoom: f32,
    pub rotation: Rotation,
}

/// Raster and text layout of a rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub ticket: RenderTicket,
    pub raster: RgbaImage,
    pub text: PageText,
}

/// Issues render tokens and tells current requests from stale ones.
#[derive(Debug, Default)]
pub struct RenderSequencer {
    latest: u64,
}

impl RenderSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, page: u32, zoom: f32, rotation: Rotation) -> RenderTicket {
        self.latest += 1;
        RenderTicket { token: self.latest, page, zoom, rotation }
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn is_current(&self, ticket: &RenderTicket) -> bool {
        ticket.token == self.latest
    }
}

/// Drives the PDF engine for a single page.
pub struct PageRenderer;

impl PageRenderer {
    /// Rasterizes the ticket's page and extracts its text in one viewport.
    pub fn render<E: PdfEngine + ?Sized>(
        engine: &E,
        handle: DocumentHandle,
        ticket: &RenderTicket,
    ) -> EditorResult<RenderedPage> {
        let page_index = ticket.page.checked_sub(1).ok_or_else(|| EditorError::Render {
            page: ticket.page,
            reason: "page numbers start at 1".into(),
        })?;

        let viewport = engine
            .viewport(handle, page_index, ticket.zoom, ticket.rotation)
            .map_err(|e| EditorError::render(ticket.page, e))?;

        let request = RenderRequest {
            page_index,
            scale: ticket.zoom,
            rotation: ticket.rotation,
            clip: None,
        };
        let raster = engine
            .render_page(handle, request)
            .map_err(|e| EditorError::render(ticket.page, e))?;

        let items = engine
            .text_content(handle, page_index)
            .map_err(|e| EditorError::render(ticket.page, e))?;

        tracing::debug!(
            page = ticket.page,
            token = ticket.token,
            width = raster.width(),
            height = raster.height(),
            text_items = items.len(),
            "rendered page"
        );

        Ok(RenderedPage { ticket: *ticket, raster, text: PageText::new(items, viewport) })
    }
}
