//! # Undo History
//!
//! Bounded log of whole-scene snapshots with a cursor.
//!
//! - Taking a snapshot discards every entry after the cursor
//! - The oldest entry is dropped once the log exceeds its depth
//! - Undo steps the cursor back and hands out the entry to restore
//! - The first entry can never be undone past
//!
//! There is no redo: the entries after the cursor stay in the log only
//! until the next snapshot truncates them.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use pdf_engine::RgbaImage;

use crate::scene::RasterId;

/// Serialized scene plus the rasters it references.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    payload: Arc<str>,
    rasters: HashMap<RasterId, Arc<RgbaImage>>,
}

impl HistorySnapshot {
    pub(crate) fn new(payload: String, rasters: HashMap<RasterId, Arc<RgbaImage>>) -> Self {
        Self { payload: payload.into(), rasters }
    }

    /// JSON form of the object list.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn rasters(&self) -> &HashMap<RasterId, Arc<RgbaImage>> {
        &self.rasters
    }
}

/// Linear undo log
#[derive(Debug)]
pub struct HistoryLog {
    entries: VecDeque<HistorySnapshot>,
    /// Index of the entry matching the live scene, `None` when empty
    cursor: Option<usize>,
    max_depth: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(20)
    }
}

impl HistoryLog {
    pub fn new(max_depth: usize) -> Self {
        Self { entries: VecDeque::new(), cursor: None, max_depth: max_depth.max(1) }
    }

    /// Records the state after a mutation.
    pub fn snapshot(&mut self, snapshot: HistorySnapshot) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push_back(snapshot);

        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
            tracing::trace!(max_depth = self.max_depth, "evicted oldest history entry");
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Moves the cursor back one entry and returns the state to restore.
    ///
    /// Returns `None` (and changes nothing) at the first entry.
    pub fn undo(&mut self) -> Option<&HistorySnapshot> {
        let cursor = self.cursor.filter(|c| *c > 0)? - 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor)
    }

    /// The entry [`HistoryLog::undo`] would return, without moving the cursor.
    pub fn previous(&self) -> Option<&HistorySnapshot> {
        let cursor = self.cursor.filter(|c| *c > 0)? - 1;
        self.entries.get(cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.entries.get(self.cursor?)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drops every entry, e.g. when a new page is shown.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}
