use std::fmt::Write as _;
use std::path::Path;

use gatewatch_core::GatewaySnapshot;

use super::yes_no;

fn path_or_missing(path: Option<&Path>) -> String {
    path.map_or_else(|| "(not found)".to_string(), |p| p.display().to_string())
}

/// Multi-line `key: value` rendering for one-shot commands.
pub fn format_snapshot(snapshot: &GatewaySnapshot) -> String {
    let mut out = String::new();
    let mut line = |key: &str, value: &dyn std::fmt::Display| {
        let _ = writeln!(out, "{:<12}{value}", format!("{key}:"));
    };

    line("Status", &snapshot.status);
    line("Mode", &snapshot.launch_mode);
    line("Installed", &yes_no(snapshot.installed));
    if snapshot.status.is_running() {
        line("Sessions", &snapshot.session_count);
        line("Connected", &yes_no(snapshot.connected));
    }
    line("Runtime", &path_or_missing(snapshot.paths.runtime.as_deref()));
    line(
        "Artifact",
        &path_or_missing(snapshot.paths.entry_artifact.as_deref()),
    );
    if let Some(valid) = snapshot.override_valid {
        line("Override", &if valid { "valid" } else { "invalid" });
    }
    if snapshot.updating {
        line("Updating", &"yes");
    }
    if let Some(error) = &snapshot.last_error {
        line("Last error", error);
    }
    out
}

/// Single line per published snapshot for `watch`.
pub fn format_status_line(snapshot: &GatewaySnapshot) -> String {
    let time = snapshot
        .refreshed_at
        .map_or_else(|| "--:--:--".to_string(), |t| t.format("%H:%M:%S").to_string());

    let mut line = format!("[{time}] {} ({})", snapshot.status, snapshot.launch_mode);
    if snapshot.status.is_running() {
        let _ = write!(
            line,
            " sessions={} connected={}",
            snapshot.session_count,
            yes_no(snapshot.connected)
        );
    }
    if snapshot.updating {
        line.push_str(" updating");
    }
    if let Some(error) = &snapshot.last_error {
        let _ = write!(line, " error=\"{error}\"");
    }
    line
}
