//! Settings repository trait definition.
//!
//! This port defines the interface for supervisor settings persistence.
//! Implementations handle all storage details internally.

use async_trait::async_trait;

use super::RepositoryError;
use crate::settings::Settings;

/// Repository for supervisor settings persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Load settings.
    ///
    /// Returns default settings if none are stored.
    async fn load(&self) -> Result<Settings, RepositoryError>;

    /// Save settings.
    async fn save(&self, settings: &Settings) -> Result<(), RepositoryError>;
}
