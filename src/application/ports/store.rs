//! Idea store port interface

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::config::UserSettings;
use crate::domain::memory::{Idea, Link};

/// Persistence errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Failed to read {0}")]
    ReadError(String),

    #[error("Failed to parse {0}")]
    ParseError(String),

    #[error("Failed to write {0}")]
    WriteError(String),
}

/// Port for idea, link, and settings persistence
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// All ideas, most recent first
    async fn ideas(&self) -> Result<Vec<Idea>, StoreError>;

    /// Insert or replace by id. New ideas go to the front.
    async fn save_idea(&self, idea: Idea) -> Result<(), StoreError>;

    /// Delete an idea and every link touching it.
    ///
    /// # Returns
    /// Whether an idea with that id existed
    async fn delete_idea(&self, id: Uuid) -> Result<bool, StoreError>;

    /// All links
    async fn links(&self) -> Result<Vec<Link>, StoreError>;

    /// Append a link. No-op if its id is already stored.
    async fn save_link(&self, link: Link) -> Result<(), StoreError>;

    /// Stored settings, or defaults when none were saved
    async fn settings(&self) -> Result<UserSettings, StoreError>;

    /// Replace the stored settings
    async fn save_settings(&self, settings: &UserSettings) -> Result<(), StoreError>;

    /// Remove ideas, links, and settings
    async fn clear_all(&self) -> Result<(), StoreError>;
}
