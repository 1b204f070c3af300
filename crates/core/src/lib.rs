//! PDF Canvas Core Library
//!
//! Editing state for a PDF page canvas: scene graph, undo history, tool
//! modes, page text hit testing and export.

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod history;
pub mod input;
pub mod notification;
pub mod render;
pub mod scene;
pub mod session;
pub mod text_hit;
pub mod tools;

pub use config::{ConfigError, EditorConfig};
pub use document::{Document, ZoomRange};
pub use error::{EditorError, EditorResult};
pub use geometry::{Matrix, Point, Rect};
pub use history::{HistoryLog, HistorySnapshot};
pub use input::{Key, KeyAction, KeyEvent, PointerEvent, PointerPhase};
pub use notification::{Notification, NotificationCenter, NotificationLevel};
pub use render::{PageRenderer, RenderSequencer, RenderTicket, RenderedPage};
pub use scene::{
    Color, FontStyle, ObjectId, ObjectKind, RasterId, SceneGraph, SceneObject, ShapeGeometry,
    ShapeKind, Style,
};
pub use session::{EditorSession, RenderApplied, PDF_MIME};
pub use text_hit::{PageText, TextHit, TextPlacement, TextReplacement};
pub use tools::{Cursor, ToolController, ToolMode, ToolOutcome, ToolSettings};

pub use pdf_engine::Rotation;
