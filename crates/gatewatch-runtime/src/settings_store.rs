//! JSON file implementation of the settings repository.

use std::path::PathBuf;

use async_trait::async_trait;
use gatewatch_core::ports::SettingsRepository;
use gatewatch_core::{RepositoryError, Settings};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Settings persisted as pretty-printed JSON at a fixed path.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn storage(context: &str, e: &std::io::Error) -> RepositoryError {
    RepositoryError::Storage(format!("{context}: {e}"))
}

#[async_trait]
impl SettingsRepository for JsonSettingsStore {
    async fn load(&self) -> Result<Settings, RepositoryError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(storage("failed to read settings", &e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError> {
        let data = serde_json::to_vec_pretty(settings)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| storage("failed to create settings dir", &e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| storage("failed to write temp file", &e))?;
        file.write_all(&data)
            .await
            .map_err(|e| storage("failed to write temp file", &e))?;
        file.flush()
            .await
            .map_err(|e| storage("failed to flush temp file", &e))?;

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage("failed to persist settings", &e))?;

        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}
