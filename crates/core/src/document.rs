//! Open document state: current page, zoom and rotation

use pdf_engine::{DocumentHandle, Rotation};

use crate::config::EditorConfig;

/// Clamped zoom range with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ZoomRange {
    /// Limits `zoom` to the range. An inverted range resolves to `max`.
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.max(self.min).min(self.max)
    }
}

impl From<&EditorConfig> for ZoomRange {
    fn from(config: &EditorConfig) -> Self {
        Self { min: config.min_zoom, max: config.max_zoom, step: config.zoom_step }
    }
}

/// A loaded PDF and its view parameters.
///
/// Pages are numbered from 1. Navigation never leaves `[1, page_count]`
/// and zoom never leaves the configured range.
#[derive(Debug, Clone)]
pub struct Document {
    handle: DocumentHandle,
    page_count: u32,
    current_page: u32,
    rotation: Rotation,
    zoom: f32,
    zoom_range: ZoomRange,
}

impl Document {
    pub fn new(handle: DocumentHandle, page_count: u32, config: &EditorConfig) -> Self {
        let zoom_range = ZoomRange::from(config);
        Self {
            handle,
            page_count,
            current_page: 1,
            rotation: Rotation::Deg0,
            zoom: zoom_range.clamp(config.default_zoom),
            zoom_range,
        }
    }

    pub fn handle(&self) -> DocumentHandle {
        self.handle
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page <= 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page >= self.page_count
    }

    /// Advances one page. Returns false on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.is_last_page() {
            return false;
        }
        self.current_page += 1;
        true
    }

    /// Goes back one page. Returns false on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.is_first_page() {
            return false;
        }
        self.current_page -= 1;
        true
    }

    /// Jumps to `page`. Out-of-range or unchanged targets return false.
    pub fn go_to_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.page_count || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.set_zoom(self.zoom + self.zoom_range.step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.set_zoom(self.zoom - self.zoom_range.step)
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = self.zoom_range.clamp(zoom);
        self.zoom
    }

    /// Puts page, zoom and rotation back to a previously displayed view.
    pub(crate) fn restore_view(&mut self, page: u32, zoom: f32, rotation: Rotation) {
        self.current_page = page.clamp(1, self.page_count.max(1));
        self.zoom = self.zoom_range.clamp(zoom);
        self.rotation = rotation;
    }

    /// Rotates a quarter turn clockwise.
    pub fn rotate(&mut self) -> Rotation {
        self.rotation = self.rotation.rotated();
        self.rotation
    }
}
