//! User-facing messages raised by the editor
//!
//! The host drains the queue and decides how to display each message.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self { message: message.into(), level }
    }
}

/// Bounded queue of pending notifications, oldest first.
#[derive(Debug)]
pub struct NotificationCenter {
    pending: VecDeque<Notification>,
    capacity: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { pending: VecDeque::new(), capacity: capacity.max(1) }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        if self.pending.len() == self.capacity {
            self.pending.pop_front();
        }
        self.pending.push_back(Notification::new(message, level));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Error);
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.pending.back()
    }

    /// Removes and returns every pending notification.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut center = NotificationCenter::new();
        center.info("loaded");
        center.warn("missing url");

        let drained = center.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NotificationLevel::Info);
        assert_eq!(drained[1].message, "missing url");
        assert!(center.is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut center = NotificationCenter::with_capacity(2);
        center.info("one");
        center.info("two");
        center.error("three");

        assert_eq!(center.len(), 2);
        assert_eq!(center.latest().map(|n| n.level), Some(NotificationLevel::Error));
        assert_eq!(center.drain()[0].message, "two");
    }
}
