//! Port for the `config.toml` holding the API key, model, and data directory

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Persistent connection and storage configuration.
///
/// Voice and turn-taking preferences are not stored here; they live with the
/// ideas in [`IdeaStore`](super::IdeaStore) settings.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored values. A missing file yields an all-`None` config.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Replace the stored values, creating parent directories as needed
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write a file holding the default model.
    /// Fails with [`ConfigError::AlreadyExists`] rather than overwrite.
    async fn init(&self) -> Result<(), ConfigError>;
}
