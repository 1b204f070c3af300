//! Host input events and their editor meaning

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// Pointer event in canvas coordinates.
///
/// `position` is `None` when the host could not map the event onto the
/// canvas; such events are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Option<Point>,
    /// Monotonic host time, used for click detection
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl PointerEvent {
    pub fn down(x: f32, y: f32) -> Self {
        Self { phase: PointerPhase::Down, position: Some(Point::new(x, y)), timestamp_ms: 0 }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self { phase: PointerPhase::Move, position: Some(Point::new(x, y)), timestamp_ms: 0 }
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self { phase: PointerPhase::Up, position: Some(Point::new(x, y)), timestamp_ms: 0 }
    }

    /// Position usable on the canvas. Non-finite coordinates count as no
    /// position.
    pub fn canvas_position(&self) -> Option<Point> {
        self.position.filter(Point::is_finite)
    }

    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Delete,
    Backspace,
    ArrowLeft,
    ArrowRight,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub ctrl: bool,
    /// Command key on macOS
    #[serde(default)]
    pub meta: bool,
    /// Focus is inside a host form field
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, ctrl: false, meta: false, in_text_input: false }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }

    /// Editor command bound to this key, if any.
    ///
    /// Deletion is suppressed while a text object is being edited or a form
    /// field has focus; arrows only page when no form field has focus.
    pub fn action(&self, editing_text: bool) -> Option<KeyAction> {
        match self.key {
            Key::Delete | Key::Backspace if !editing_text && !self.in_text_input => {
                Some(KeyAction::DeleteSelection)
            }
            Key::Char('z') if self.ctrl || self.meta => Some(KeyAction::Undo),
            Key::ArrowLeft if !self.in_text_input => Some(KeyAction::PreviousPage),
            Key::ArrowRight if !self.in_text_input => Some(KeyAction::NextPage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    DeleteSelection,
    Undo,
    PreviousPage,
    NextPage,
}
