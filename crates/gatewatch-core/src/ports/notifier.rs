//! Notification sink port.

use crate::domain::Notification;

/// Fire-and-forget sink for user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
