//! Terminal output: snapshots, resolution diagnostics and notices.

mod notices;
mod resolution;
mod snapshot;

pub use notices::ConsoleNotifier;
pub use resolution::format_resolution;
pub use snapshot::{format_snapshot, format_status_line};

/// `yes` / `no`
pub const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
