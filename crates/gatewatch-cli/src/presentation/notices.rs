use gatewatch_core::ports::Notifier;
use gatewatch_core::{Notification, NotificationLevel};

/// Prints notices to stderr so stdout stays parseable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let marker = match notification.level {
            NotificationLevel::Info => "•",
            NotificationLevel::Warning => "!",
            NotificationLevel::Error => "✗",
        };
        eprintln!("{marker} {}: {}", notification.title, notification.body);
    }
}
