//! Notification sink that writes notices to the log.

use gatewatch_core::ports::Notifier;
use gatewatch_core::{Notification, NotificationLevel};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification { level, title, body } = notification;
        match level {
            NotificationLevel::Info => info!(%title, %body, "notice"),
            NotificationLevel::Warning => warn!(%title, %body, "notice"),
            NotificationLevel::Error => error!(%title, %body, "notice"),
        }
    }
}
