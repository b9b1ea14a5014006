use std::fmt::Write as _;

use gatewatch_runtime::Resolution;

/// Resolved path followed by every candidate that was checked.
pub fn format_resolution(label: &str, resolution: &Resolution) -> String {
    let mut out = match &resolution.resolved {
        Some(path) => format!("{label} = {}\n", path.display()),
        None => format!("{label} = (not found)\n"),
    };
    for attempt in &resolution.attempts {
        let _ = writeln!(out, "    {attempt}");
    }
    out
}
