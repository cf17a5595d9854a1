//! User-facing notification seam.
//
//  The scheduler emits one message per fired rule and a generic one when a
//  pass fails; the hosting UI decides how to render them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, note: Notification);
}

/// Sink that only logs, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, note: Notification) {
        match note.kind {
            NotificationKind::Error => {
                tracing::warn!(title = %note.title, message = %note.message, "notification")
            }
            _ => tracing::info!(title = %note.title, message = %note.message, "notification"),
        }
    }
}
