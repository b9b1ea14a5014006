//! Session count from the gateway's state file.

use std::path::PathBuf;

use async_trait::async_trait;
use gatewatch_core::ports::SessionCounter;
use serde_json::Value;
use tracing::debug;

/// Counts top-level keys of the sessions JSON object.
pub struct SessionFileCounter {
    path: PathBuf,
}

impl SessionFileCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionCounter for SessionFileCounter {
    async fn count(&self) -> usize {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No sessions file");
                return 0;
            }
        };

        match serde_json::from_slice::<Value>(&contents) {
            Ok(Value::Object(map)) => map.len(),
            Ok(_) => 0,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Unreadable sessions file");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn counts_top_level_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, r#"{"a": {"x": 1}, "b": {}, "c": null}"#).unwrap();

        assert_eq!(SessionFileCounter::new(&path).count().await, 3);
    }

    #[tokio::test]
    async fn missing_or_malformed_file_counts_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        assert_eq!(SessionFileCounter::new(&path).count().await, 0);

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(SessionFileCounter::new(&path).count().await, 0);

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert_eq!(SessionFileCounter::new(&path).count().await, 0);
    }
}
