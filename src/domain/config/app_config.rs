//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Live model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Create config with default values.
    /// The data directory default depends on the platform and is resolved by the store.
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            model: Some(DEFAULT_MODEL.to_string()),
            data_dir: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            model: other.model.or(self.model),
            data_dir: other.data_dir.or(self.data_dir),
        }
    }

    /// Get the model name, or the default if not set or blank
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }

    /// Get the data directory, or `fallback` if not set
    pub fn data_dir_or(&self, fallback: impl FnOnce() -> PathBuf) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(fallback)
    }
}
