//! User-facing notifications
//!
//! Every failure the console catches ends up here instead of propagating to
//! the UI as an error.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// An operation completed
    Success,
    /// Neutral information
    Info,
    /// Something was rejected before reaching the server
    Warning,
    /// A remote call failed
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity
    pub level: Level,
    /// Text shown to the user
    pub message: String,
    /// When it was raised
    pub at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification stamped with the current time
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Success notification
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    /// Informational notification
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    /// Warning notification
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    /// Error notification
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    fn notify(&self, notification: Notification);
}

/// Shared handle to a notifier
pub type SharedNotifier = Arc<dyn Notifier>;

/// Bounded toast queue drained by the UI
///
/// When full, the oldest toast is dropped to make room.
#[derive(Debug)]
pub struct ToastQueue {
    capacity: usize,
    toasts: Mutex<VecDeque<Notification>>,
}

impl ToastQueue {
    /// Create a queue holding at most `capacity` toasts (minimum one)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            toasts: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Maximum number of pending toasts
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take every pending toast, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        self.toasts.lock().drain(..).collect()
    }

    /// Copy of the pending toasts without removing them
    #[must_use]
    pub fn pending(&self) -> Vec<Notification> {
        self.toasts.lock().iter().cloned().collect()
    }

    /// Number of pending toasts
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.lock().len()
    }

    /// Whether no toast is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.lock().is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notification: Notification) {
        let mut toasts = self.toasts.lock();
        while toasts.len() >= self.capacity {
            toasts.pop_front();
        }
        toasts.push_back(notification);
    }
}

/// Notifier that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message.as_str();
        match notification.level {
            Level::Success | Level::Info => info!(level = %notification.level, "{message}"),
            Level::Warning => warn!("{message}"),
            Level::Error => error!("{message}"),
        }
    }
}

/// Label as it reads mid-sentence; acronyms keep their case
pub(crate) fn noun(label: &str) -> String {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if second.is_lowercase() => {
            first.to_lowercase().chain(label.chars().skip(1)).collect()
        }
        _ => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let queue = ToastQueue::new(2);
        queue.notify(Notification::info("one"));
        queue.notify(Notification::warning("two"));
        queue.notify(Notification::error("three"));

        let messages: Vec<_> = queue.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let queue = ToastQueue::new(0);
        queue.notify(Notification::success("saved"));
        queue.notify(Notification::success("saved again"));
        assert_eq!(queue.capacity(), 1);
        assert_eq!(queue.pending()[0].message, "saved again");
    }

    #[test]
    fn test_noun() {
        assert_eq!(noun("Ticket type"), "ticket type");
        assert_eq!(noun("POS device"), "POS device");
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&Level::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn test_tracing_notifier_accepts_every_level() {
        let notifier = TracingNotifier;
        for level in [Level::Success, Level::Info, Level::Warning, Level::Error] {
            notifier.notify(Notification::new(level, "ping"));
        }
    }
}
