//! Numeric ordering of version-manager directory names.

use std::cmp::Ordering;

/// Parse `v20.11.1` / `20.11.1` / `10.10` into numeric components.
///
/// Anything with a non-numeric component (`system`, `lts-iron`) is rejected.
pub fn parse_version(name: &str) -> Option<Vec<u64>> {
    let trimmed = name.strip_prefix('v').unwrap_or(name);
    if trimmed.is_empty() {
        return None;
    }
    trimmed.split('.').map(|part| part.parse().ok()).collect()
}

/// Compare two directory names by their numeric components.
///
/// Unparseable names sort below every version.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Version directory names, highest first, with non-versions dropped.
pub fn sort_versions_desc(names: &[String]) -> Vec<String> {
    let mut versions: Vec<String> = names
        .iter()
        .filter(|name| parse_version(name).is_some())
        .cloned()
        .collect();
    versions.sort_by(|a, b| compare_versions(b, a));
    versions
}
